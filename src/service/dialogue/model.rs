use serde::{Deserialize, Serialize};

/// A product and weight picked in a city, with the marked-up price frozen.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PricedItem {
    pub city: String,
    pub product_id: String,
    pub product_name: String,
    pub weight: String,
    pub price: u64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TypedItem {
    pub item: PricedItem,
    pub product_type: String,
}

/// All selections of the purchase flow. `district` is `None` for cities
/// without selectable districts.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct OrderDraft {
    pub item: TypedItem,
    pub district: Option<String>,
}

impl OrderDraft {
    pub fn city(&self) -> &str {
        &self.item.item.city
    }

    pub fn product_name(&self) -> &str {
        &self.item.item.product_name
    }

    pub fn weight(&self) -> &str {
        &self.item.item.weight
    }

    pub fn product_type(&self) -> &str {
        &self.item.product_type
    }

    pub fn price(&self) -> u64 {
        self.item.item.price
    }
}

/// Per-conversation state. Each variant carries exactly the selections that
/// are valid at that step.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq)]
pub enum DialogueState {
    #[default]
    Start,
    // Purchase flow
    SelectCity {
        page: usize,
    },
    SearchCity {
        prompt_message_id: Option<i32>,
    },
    SelectProduct {
        city: String,
    },
    SelectPrice {
        city: String,
        product_id: String,
    },
    SelectType {
        item: PricedItem,
    },
    SelectDistrict {
        item: TypedItem,
        page: usize,
    },
    SearchDistrict {
        item: TypedItem,
        prompt_message_id: Option<i32>,
    },
    ConfirmOrder {
        draft: OrderDraft,
    },
    SelectPayment {
        draft: OrderDraft,
    },
    PaymentPending {
        order_id: String,
        payment_message_id: Option<i32>,
    },
    // Administration
    AdminPassword {
        prompt_message_id: Option<i32>,
    },
    /// `query` filters the order list while a search is active.
    AdminMenu {
        query: Option<String>,
    },
    AdminSearchOrders {
        prompt_message_id: Option<i32>,
    },
    /// Browsing user profiles, filtered by `query` while a search is active.
    AdminProfiles {
        query: Option<String>,
    },
    AdminSearchProfiles {
        prompt_message_id: Option<i32>,
    },
}

impl DialogueState {
    pub fn in_purchase_flow(&self) -> bool {
        !matches!(
            self,
            DialogueState::Start
                | DialogueState::AdminPassword { .. }
                | DialogueState::AdminMenu { .. }
                | DialogueState::AdminSearchOrders { .. }
                | DialogueState::AdminProfiles { .. }
                | DialogueState::AdminSearchProfiles { .. }
        )
    }

    /// The prompt or payment message to clean up when this state is left.
    pub fn tracked_message(&self) -> Option<i32> {
        match self {
            DialogueState::SearchCity { prompt_message_id }
            | DialogueState::SearchDistrict { prompt_message_id, .. }
            | DialogueState::AdminPassword { prompt_message_id }
            | DialogueState::AdminSearchOrders { prompt_message_id }
            | DialogueState::AdminSearchProfiles { prompt_message_id } => *prompt_message_id,
            DialogueState::PaymentPending { payment_message_id, .. } => *payment_message_id,
            _ => None,
        }
    }

    /// Records the id of the message that was sent to render this state.
    pub fn attach_message(self, message_id: i32) -> Self {
        match self {
            DialogueState::SearchCity { .. } => DialogueState::SearchCity {
                prompt_message_id: Some(message_id),
            },
            DialogueState::SearchDistrict { item, .. } => DialogueState::SearchDistrict {
                item,
                prompt_message_id: Some(message_id),
            },
            DialogueState::PaymentPending { order_id, .. } => DialogueState::PaymentPending {
                order_id,
                payment_message_id: Some(message_id),
            },
            DialogueState::AdminPassword { .. } => DialogueState::AdminPassword {
                prompt_message_id: Some(message_id),
            },
            DialogueState::AdminSearchOrders { .. } => DialogueState::AdminSearchOrders {
                prompt_message_id: Some(message_id),
            },
            DialogueState::AdminSearchProfiles { .. } => DialogueState::AdminSearchProfiles {
                prompt_message_id: Some(message_id),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_message_only_touches_tracking_states() {
        let state = DialogueState::SearchCity { prompt_message_id: None }.attach_message(5);
        assert_eq!(state.tracked_message(), Some(5));

        let state = DialogueState::SelectCity { page: 1 }.attach_message(5);
        assert_eq!(state, DialogueState::SelectCity { page: 1 });
        assert_eq!(state.tracked_message(), None);

        let state = DialogueState::AdminSearchProfiles { prompt_message_id: None }.attach_message(8);
        assert_eq!(state.tracked_message(), Some(8));
    }

    #[test]
    fn test_flow_membership() {
        assert!(!DialogueState::Start.in_purchase_flow());
        assert!(!DialogueState::AdminMenu { query: None }.in_purchase_flow());
        assert!(!DialogueState::AdminProfiles { query: None }.in_purchase_flow());
        assert!(!DialogueState::AdminSearchProfiles { prompt_message_id: None }.in_purchase_flow());
        assert!(DialogueState::SelectCity { page: 0 }.in_purchase_flow());
    }

    #[test]
    fn test_state_serializes_for_dialogue_storage() {
        let state = DialogueState::PaymentPending {
            order_id: "1234567890".into(),
            payment_message_id: Some(3),
        };
        let raw = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<DialogueState>(&raw).unwrap(), state);
    }
}
