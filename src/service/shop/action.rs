/// Choice key for "no district" in cities without selectable districts.
pub const NO_DISTRICT_KEY: &str = "-";

const PREFIX: &str = "shop";

/// A customer's input to the purchase flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopAction {
    /// Start (or restart) the flow from the city list.
    Enter,
    Page(usize),
    Search,
    Choose(String),
    Confirm,
    Back,
    Cancel,
    /// Free text typed while a search prompt is open.
    Text(String),
}

impl ShopAction {
    /// Parses inline keyboard callback data such as `shop:pick:Moscow`.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        if parts.next()? != PREFIX {
            return None;
        }

        match (parts.next()?, parts.next()) {
            ("enter", None) => Some(ShopAction::Enter),
            ("page", Some(page)) => page.parse().ok().map(ShopAction::Page),
            ("search", None) => Some(ShopAction::Search),
            ("pick", Some(key)) if !key.is_empty() => Some(ShopAction::Choose(key.to_string())),
            ("confirm", None) => Some(ShopAction::Confirm),
            ("back", None) => Some(ShopAction::Back),
            ("cancel", None) => Some(ShopAction::Cancel),
            _ => None,
        }
    }

    /// Callback data for this action. Free text has no callback form.
    pub fn callback_data(&self) -> Option<String> {
        let data = match self {
            ShopAction::Enter => format!("{PREFIX}:enter"),
            ShopAction::Page(page) => format!("{PREFIX}:page:{page}"),
            ShopAction::Search => format!("{PREFIX}:search"),
            ShopAction::Choose(key) => format!("{PREFIX}:pick:{key}"),
            ShopAction::Confirm => format!("{PREFIX}:confirm"),
            ShopAction::Back => format!("{PREFIX}:back"),
            ShopAction::Cancel => format!("{PREFIX}:cancel"),
            ShopAction::Text(_) => return None,
        };
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callbacks() {
        assert_eq!(ShopAction::parse("shop:enter"), Some(ShopAction::Enter));
        assert_eq!(ShopAction::parse("shop:page:3"), Some(ShopAction::Page(3)));
        assert_eq!(
            ShopAction::parse("shop:pick:Old Town: East"),
            Some(ShopAction::Choose("Old Town: East".into()))
        );
        assert_eq!(ShopAction::parse("shop:page:x"), None);
        assert_eq!(ShopAction::parse("shop:pick:"), None);
        assert_eq!(ShopAction::parse("admin:orders:0"), None);
        assert_eq!(ShopAction::parse("shop:back:extra"), None);
    }

    #[test]
    fn test_callback_data_parses_back() {
        let action = ShopAction::Choose("!gift".into());
        let data = action.callback_data().unwrap();
        assert_eq!(ShopAction::parse(&data), Some(action));
        assert!(ShopAction::Text("x".into()).callback_data().is_none());
    }

    #[test]
    fn test_choice_prefix_matches_catalog_limit() {
        let data = ShopAction::Choose("Tver".into()).callback_data().unwrap();
        assert_eq!(data, format!("{}Tver", crate::catalog::CHOICE_PREFIX));
    }
}
