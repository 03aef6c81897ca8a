use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::service::{
    order::{Order, OrderPage, OrderStatus},
    pricing::format_price,
    shop::{Paged, Screen, ShopAction, NO_DISTRICT_KEY},
    user::{ProfileEntry, ProfilePage},
};

const LIST_COLUMNS: usize = 2;

fn shop_button(text: impl Into<String>, action: ShopAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.callback_data().unwrap_or_default())
}

fn back_row() -> Vec<InlineKeyboardButton> {
    vec![shop_button(t!("buttons.back"), ShopAction::Back)]
}

fn support_button(support_username: &str) -> Option<InlineKeyboardButton> {
    let url = Url::parse(&format!("https://t.me/{}", support_username)).ok()?;
    Some(InlineKeyboardButton::url(t!("buttons.main_menu.support"), url))
}

fn choice_rows(choices: &[String], columns: usize) -> Vec<Vec<InlineKeyboardButton>> {
    choices
        .chunks(columns)
        .map(|chunk| {
            chunk
                .iter()
                .map(|choice| shop_button(choice.clone(), ShopAction::Choose(choice.clone())))
                .collect()
        })
        .collect()
}

fn page_row<T: Clone>(paged: &Paged<T>) -> Option<Vec<InlineKeyboardButton>> {
    let mut row = Vec::new();
    if paged.has_previous() {
        row.push(shop_button(t!("buttons.previous"), ShopAction::Page(paged.page - 1)));
    }
    if paged.has_next() {
        row.push(shop_button(t!("buttons.next"), ShopAction::Page(paged.page + 1)));
    }
    (!row.is_empty()).then_some(row)
}

fn paged_choices(paged: &Paged<String>) -> Vec<Vec<InlineKeyboardButton>> {
    let mut keyboard = vec![vec![shop_button(t!("buttons.search"), ShopAction::Search)]];
    keyboard.extend(choice_rows(&paged.items, LIST_COLUMNS));
    keyboard.extend(page_row(paged));
    keyboard.push(back_row());
    keyboard
}

pub fn get_main_menu_keyboard(support_username: &str) -> InlineKeyboardMarkup {
    let mut keyboard = vec![
        vec![shop_button(t!("buttons.main_menu.shop"), ShopAction::Enter)],
        vec![
            InlineKeyboardButton::callback(t!("buttons.main_menu.profile"), "menu:profile"),
            InlineKeyboardButton::callback(t!("buttons.main_menu.history"), "menu:history"),
        ],
    ];
    keyboard.extend(support_button(support_username).map(|button| vec![button]));

    InlineKeyboardMarkup::new(keyboard)
}

pub fn get_back_to_main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        t!("buttons.back_to_main_menu"),
        "menu:main",
    )]])
}

pub fn get_screen_keyboard(screen: &Screen, support_username: &str) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = match screen {
        Screen::MainMenu => return get_main_menu_keyboard(support_username),
        Screen::Cities(paged) => paged_choices(paged),
        Screen::CitySearchPrompt { .. } | Screen::DistrictSearchPrompt { .. } => vec![back_row()],
        Screen::CitySearchResults(found) | Screen::DistrictSearchResults(found) => {
            let mut keyboard = choice_rows(found, 1);
            keyboard.push(vec![shop_button(t!("buttons.back_to_list"), ShopAction::Page(0))]);
            keyboard
        }
        Screen::Products { products, .. } => {
            let mut keyboard: Vec<_> = products
                .iter()
                .map(|product| vec![shop_button(product.name.clone(), ShopAction::Choose(product.id.clone()))])
                .collect();
            keyboard.push(back_row());
            keyboard
        }
        Screen::Prices { tiers, .. } => {
            let mut keyboard: Vec<_> = tiers
                .iter()
                .map(|tier| {
                    let text = t!("buttons.price_tier", label = tier.label, price = format_price(tier.price));
                    vec![shop_button(text, ShopAction::Choose(tier.label.clone()))]
                })
                .collect();
            keyboard.push(back_row());
            keyboard
        }
        Screen::Types { types, .. } => {
            let mut keyboard: Vec<_> = types
                .iter()
                .map(|(index, name)| vec![shop_button(name.clone(), ShopAction::Choose(index.to_string()))])
                .collect();
            keyboard.push(back_row());
            keyboard
        }
        Screen::Districts(paged) if paged.items.is_empty() => vec![
            vec![shop_button(
                t!("buttons.no_district"),
                ShopAction::Choose(NO_DISTRICT_KEY.to_string()),
            )],
            back_row(),
        ],
        Screen::Districts(paged) => paged_choices(paged),
        Screen::Confirm(_) => vec![
            vec![
                shop_button(t!("buttons.confirm"), ShopAction::Confirm),
                shop_button(t!("buttons.cancel"), ShopAction::Cancel),
            ],
            back_row(),
        ],
        Screen::PaymentMethods(methods) => {
            let mut keyboard = choice_rows(methods, LIST_COLUMNS);
            keyboard.push(back_row());
            keyboard
        }
        Screen::PaymentInstructions { .. } => {
            let mut row = vec![shop_button(t!("buttons.cancel_order"), ShopAction::Cancel)];
            row.extend(support_button(support_username));
            vec![row]
        }
        Screen::PaymentClosed { .. } => {
            let mut keyboard: Vec<_> = support_button(support_username).map(|b| vec![b]).into_iter().collect();
            keyboard.push(vec![InlineKeyboardButton::callback(
                t!("buttons.back_to_main_menu"),
                "menu:main",
            )]);
            keyboard
        }
    };

    InlineKeyboardMarkup::new(keyboard)
}

pub fn get_admin_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback(t!("buttons.admin.orders"), "admin:all")],
        [InlineKeyboardButton::callback(t!("buttons.admin.search"), "admin:search")],
        [InlineKeyboardButton::callback(t!("buttons.admin.profiles"), "admin:users")],
        [InlineKeyboardButton::callback(t!("buttons.admin.exit"), "admin:exit")],
    ])
}

pub fn get_admin_back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(t!("buttons.back"), "admin:menu")]])
}

/// Previous and next buttons for `admin:{route}:{page}`.
fn admin_page_row(route: &str, page: usize, total_pages: usize) -> Option<Vec<InlineKeyboardButton>> {
    let mut row = Vec::new();
    if page > 0 {
        row.push(InlineKeyboardButton::callback(
            t!("buttons.previous"),
            format!("admin:{}:{}", route, page - 1),
        ));
    }
    if page + 1 < total_pages {
        row.push(InlineKeyboardButton::callback(
            t!("buttons.next"),
            format!("admin:{}:{}", route, page + 1),
        ));
    }
    (!row.is_empty()).then_some(row)
}

pub fn get_admin_orders_keyboard(page: &OrderPage) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = page
        .orders
        .iter()
        .map(|order| {
            let text = format!("#{} · {} · {}", order.order_id, order.status, format_price(order.price));
            vec![InlineKeyboardButton::callback(text, format!("admin:order:{}", order.order_id))]
        })
        .collect();

    keyboard.extend(admin_page_row("orders", page.page, page.total_pages));
    keyboard.push(vec![InlineKeyboardButton::callback(t!("buttons.back"), "admin:menu")]);

    InlineKeyboardMarkup::new(keyboard)
}

/// `@username`, or `ID{id}` for users without one.
pub fn profile_handle(entry: &ProfileEntry) -> String {
    if entry.profile.username.is_empty() {
        format!("ID{}", entry.user_id)
    } else {
        format!("@{}", entry.profile.username)
    }
}

pub fn get_admin_profiles_keyboard(page: &ProfilePage, searching: bool) -> InlineKeyboardMarkup {
    let mut search_row = vec![InlineKeyboardButton::callback(
        t!("buttons.admin.search_profiles"),
        "admin:find_profiles",
    )];
    if searching {
        search_row.push(InlineKeyboardButton::callback(t!("buttons.admin.clear_search"), "admin:users"));
    }

    let mut keyboard = vec![search_row];
    keyboard.extend(page.profiles.iter().map(|entry| {
        let text = format!("{} · {}", profile_handle(entry), format_price(entry.profile.total_spent));
        vec![InlineKeyboardButton::callback(text, format!("admin:profile:{}", entry.user_id))]
    }));
    keyboard.extend(admin_page_row("profiles", page.page, page.total_pages));
    keyboard.push(vec![InlineKeyboardButton::callback(t!("buttons.back"), "admin:menu")]);

    InlineKeyboardMarkup::new(keyboard)
}

pub fn get_admin_profile_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        t!("buttons.admin.back_to_profiles"),
        "admin:profiles:0",
    )]])
}

pub fn get_admin_order_keyboard(order: &Order) -> InlineKeyboardMarkup {
    let mut keyboard = Vec::new();

    if order.status == OrderStatus::Created {
        keyboard.push(vec![
            InlineKeyboardButton::callback(t!("buttons.admin.pay"), format!("admin:pay:{}", order.order_id)),
            InlineKeyboardButton::callback(t!("buttons.admin.cancel"), format!("admin:cancel:{}", order.order_id)),
        ]);
    }

    keyboard.push(vec![InlineKeyboardButton::callback(
        t!("buttons.admin.back_to_orders"),
        "admin:orders:0",
    )]);

    InlineKeyboardMarkup::new(keyboard)
}
