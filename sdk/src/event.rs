//! Recommended GA4 events and the editable state of a single event session.
//!
//! [EventState] replaces the ambient form contexts of a UI: every input that
//! affects the payload lives here and is passed around explicitly.

use {
    crate::{
        ids::{ClientIds, InstanceId},
        parameter::{Item, Parameter},
        payload::PayloadInput,
    },
    serde::{Deserialize, Serialize},
    strum_macros::{AsRefStr, Display, EnumIter, EnumString},
};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    CustomEvent,
    AddPaymentInfo,
    AddShippingInfo,
    AddToCart,
    AddToWishlist,
    BeginCheckout,
    EarnVirtualCurrency,
    GenerateLead,
    JoinGroup,
    LevelUp,
    Login,
    PostScore,
    Purchase,
    Refund,
    RemoveFromCart,
    Search,
    #[default]
    SelectContent,
    SelectItem,
    SelectPromotion,
    Share,
    SignUp,
    SpendVirtualCurrency,
    TutorialBegin,
    TutorialComplete,
    UnlockAchievement,
    ViewCart,
    ViewItem,
    ViewItemList,
    ViewPromotion,
    ViewSearchResults,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Category {
    Custom,
    #[strum(serialize = "All apps")]
    AllApps,
    #[strum(serialize = "Retail/Ecommerce")]
    RetailEcommerce,
    #[strum(serialize = "Jobs, Education, Local Deals, Real Estate")]
    JobsEduLocalDealsRealEstate,
    #[strum(serialize = "Travel (Hotel/Air)")]
    Travel,
    Games,
}

/// Catalog template for an [EventType].
#[derive(Clone, Debug, PartialEq)]
pub struct SuggestedEvent {
    pub event_type: EventType,
    pub categories: Vec<Category>,
    pub parameters: Vec<Parameter>,
    /// First example item for e-commerce events, `None` for events that
    /// start without items.
    pub items: Option<Vec<Item>>,
}

fn s(name: &str, example: &str) -> Parameter {
    Parameter::string(name, Some(example))
}

fn n(name: &str, example: f64) -> Parameter {
    Parameter::number(name, Some(example))
}

fn product_item(extra: Vec<Parameter>) -> Vec<Parameter> {
    let mut item = vec![
        s("item_id", "SKU_12345"),
        s("item_name", "jeggings"),
        n("quantity", 1.0),
        s("affiliation", "Google Store"),
        s("coupon", "SUMMER_FUN"),
        n("discount", 2.22),
        s("item_brand", "Gucci"),
        s("item_category", "pants"),
        s("item_variant", "Black"),
    ];
    item.extend(extra);
    item.push(n("price", 9.99));
    item.push(s("currency", "USD"));
    item
}

fn list_item() -> Vec<Parameter> {
    vec![
        s("item_id", "SKU_12345"),
        s("item_name", "jeggings"),
        n("quantity", 1.0),
        s("affiliation", "Google Store"),
        s("coupon", "SUMMER_FUN"),
        n("discount", 2.22),
        n("index", 5.0),
        s("item_brand", "Gucci"),
        s("item_category", "pants"),
        s("item_list_name", "Related products"),
        s("item_list_id", "related_products"),
        s("item_variant", "Black"),
        n("price", 9.99),
        s("currency", "USD"),
    ]
}

fn promotion_item() -> Vec<Parameter> {
    vec![
        s("item_id", "SKU_12345"),
        s("item_name", "jeggings"),
        n("quantity", 1.0),
        s("promotion_id", "P_12345"),
        s("promotion_name", "Summer Sale"),
        s("affiliation", "Google Store"),
        s("coupon", "SUMMER_FUN"),
        s("creative_name", "summer_banner2"),
        s("creative_slot", "featured_app_1"),
        n("discount", 2.22),
        s("item_brand", "Gucci"),
        s("item_category", "pants"),
        s("item_variant", "Black"),
        s("location_id", "L_12345"),
        n("price", 9.99),
        s("currency", "USD"),
    ]
}

fn transaction_params() -> Vec<Parameter> {
    vec![
        s("affiliation", "Google Store"),
        s("coupon", "SUMMER_FUN"),
        s("currency", "USD"),
        s("transaction_id", "T_12345"),
        n("shipping", 3.33),
        n("tax", 1.11),
        n("value", 12.21),
    ]
}

fn cart_params() -> Vec<Parameter> {
    vec![s("currency", "USD"), n("value", 7.77)]
}

/// Returns the catalog template for the given event type.
pub fn suggested_event_for(event_type: EventType) -> SuggestedEvent {
    use {Category::*, EventType::*};

    let (categories, parameters, first_item): (Vec<Category>, Vec<Parameter>, Option<Vec<Parameter>>) =
        match event_type {
            CustomEvent => (vec![Custom], vec![], None),
            AddPaymentInfo => (
                vec![RetailEcommerce],
                vec![
                    s("coupon", "SUMMER_FUN"),
                    s("currency", "USD"),
                    s("payment_type", "Credit Card"),
                    n("value", 7.77),
                ],
                Some(product_item(vec![])),
            ),
            AddShippingInfo => (
                vec![RetailEcommerce],
                vec![
                    s("coupon", "SUMMER_FUN"),
                    s("currency", "USD"),
                    s("shipping_tier", "Ground"),
                    n("value", 7.77),
                ],
                Some(product_item(vec![])),
            ),
            AddToCart | AddToWishlist | RemoveFromCart | ViewCart | ViewItem => (
                vec![RetailEcommerce],
                cart_params(),
                Some(product_item(vec![])),
            ),
            BeginCheckout => (
                vec![RetailEcommerce],
                vec![s("coupon", "SUMMER_FUN"), s("currency", "USD"), n("value", 7.77)],
                Some(product_item(vec![])),
            ),
            EarnVirtualCurrency => (
                vec![AllApps],
                vec![s("virtual_currency_name", "Gems"), n("value", 5.0)],
                None,
            ),
            GenerateLead => (
                vec![RetailEcommerce],
                vec![s("currency", "USD"), n("value", 99.99)],
                None,
            ),
            JoinGroup => (vec![AllApps], vec![s("group_id", "G_12345")], None),
            LevelUp => (
                vec![Games],
                vec![n("level", 5.0), s("character", "Player 1")],
                None,
            ),
            Login | SignUp => (vec![AllApps], vec![s("method", "Google")], None),
            PostScore => (
                vec![Games],
                vec![n("score", 10000.0), n("level", 5.0), s("character", "Player 1")],
                None,
            ),
            Purchase | Refund => (
                vec![AllApps],
                transaction_params(),
                Some(product_item(vec![n("tax", 1.11)])),
            ),
            Search => (vec![AllApps], vec![s("search_term", "t-shirts")], None),
            SelectContent => (
                vec![AllApps],
                vec![s("content_type", "product"), s("item_id", "I_12345")],
                None,
            ),
            SelectItem | ViewItemList => (
                vec![RetailEcommerce],
                vec![
                    s("item_list_name", "Related products"),
                    s("item_list_id", "related_products"),
                ],
                Some(list_item()),
            ),
            SelectPromotion | ViewPromotion => (
                vec![RetailEcommerce],
                vec![s("location_id", "L_12345")],
                Some(promotion_item()),
            ),
            Share => (
                vec![AllApps],
                vec![
                    s("method", "Twitter"),
                    s("content_type", "image"),
                    s("content_id", "C_12345"),
                ],
                None,
            ),
            SpendVirtualCurrency => (
                vec![AllApps],
                vec![
                    s("item_name", "Starter Boost"),
                    s("virtual_currency_name", "Gems"),
                    n("value", 5.0),
                ],
                None,
            ),
            TutorialBegin => (vec![AllApps], vec![], None),
            TutorialComplete => (vec![AllApps, Games], vec![], None),
            UnlockAchievement => (vec![Games], vec![s("achievement_id", "A_12345")], None),
            ViewSearchResults => (
                vec![RetailEcommerce],
                vec![s("search_term", "Clothing")],
                Some(list_item()),
            ),
        };

    SuggestedEvent {
        event_type,
        categories,
        parameters,
        items: first_item.map(|item| {
            if item.is_empty() {
                vec![]
            } else {
                vec![Item::new(item)]
            }
        }),
    }
}

/// Everything the user edits for one event. Serializable so that an event
/// can be stored in a file and reloaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    #[serde(default)]
    pub use_firebase: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(default)]
    pub user_properties: Vec<Parameter>,
    #[serde(default)]
    pub client_ids: ClientIds,
    #[serde(default)]
    pub instance_id: InstanceId,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_micros: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_personalized_ads: Option<bool>,
}

impl Default for EventState {
    fn default() -> Self {
        Self::for_type(EventType::default())
    }
}

impl EventState {
    /// A fresh event seeded from the catalog template of `event_type`.
    pub fn for_type(event_type: EventType) -> Self {
        let mut state = Self {
            use_firebase: false,
            event_type,
            event_name: String::new(),
            parameters: vec![],
            items: None,
            user_properties: vec![],
            client_ids: ClientIds::default(),
            instance_id: InstanceId::default(),
            api_secret: String::new(),
            timestamp_micros: None,
            non_personalized_ads: None,
        };

        state.set_type(event_type);
        state
    }

    /// Switches the event type. Parameters and items are replaced by the
    /// catalog template and the event name follows the type, except for
    /// custom events which start unnamed.
    pub fn set_type(&mut self, event_type: EventType) {
        let suggested = suggested_event_for(event_type);

        self.event_type = event_type;
        self.parameters = suggested.parameters;
        self.items = suggested.items;
        self.event_name = match event_type {
            EventType::CustomEvent => String::new(),
            other => other.to_string(),
        };
    }

    /// Borrowed view of the inputs the payload assembler needs.
    pub fn payload_input(&self) -> PayloadInput<'_> {
        PayloadInput {
            use_firebase: self.use_firebase,
            event_name: &self.event_name,
            parameters: &self.parameters,
            items: self.items.as_deref(),
            user_properties: &self.user_properties,
            client_ids: &self.client_ids,
            timestamp_micros: self.timestamp_micros.as_deref(),
            non_personalized_ads: self.non_personalized_ads,
        }
    }

    // == Event parameters ==

    pub fn add_string_param(&mut self) {
        self.parameters.push(Parameter::string("", None));
    }

    pub fn add_number_param(&mut self) {
        self.parameters.push(Parameter::number("", None));
    }

    pub fn set_param_name(&mut self, idx: usize, name: &str) {
        if let Some(param) = self.parameters.get_mut(idx) {
            param.set_name(name);
        }
    }

    pub fn set_param_value(&mut self, idx: usize, value: &str) {
        if let Some(param) = self.parameters.get_mut(idx) {
            param.set_value(value);
        }
    }

    pub fn remove_param(&mut self, idx: usize) {
        if idx < self.parameters.len() {
            self.parameters.remove(idx);
        }
    }

    // == Items ==

    /// Adds an `items` parameter holding one empty item.
    pub fn add_items_param(&mut self) {
        self.items = Some(vec![Item::default()]);
    }

    pub fn remove_items_param(&mut self) {
        self.items = None;
    }

    /// Adds an item. The first item comes from the catalog template when
    /// there is one, later items copy the shape of the first.
    pub fn add_item(&mut self) {
        let templated = self
            .items
            .as_ref()
            .and_then(|items| items.first())
            .map(Item::templated_from);

        if let (Some(nu), Some(items)) = (templated, self.items.as_mut()) {
            items.push(nu);

            return;
        }

        let suggested = suggested_event_for(self.event_type)
            .items
            .filter(|items| !items.is_empty());

        self.items = Some(suggested.unwrap_or_else(|| vec![Item::default()]));
    }

    pub fn remove_item(&mut self, idx: usize) {
        if let Some(items) = self.items.as_mut() {
            if idx < items.len() {
                items.remove(idx);
            }
        }
    }

    pub fn add_item_string_param(&mut self, idx: usize) {
        if let Some(item) = self.item_mut(idx) {
            item.parameters.push(Parameter::string("", None));
        }
    }

    pub fn add_item_number_param(&mut self, idx: usize) {
        if let Some(item) = self.item_mut(idx) {
            item.parameters.push(Parameter::number("", None));
        }
    }

    pub fn set_item_param_name(&mut self, idx: usize, param_idx: usize, name: &str) {
        if let Some(param) = self.item_param_mut(idx, param_idx) {
            param.set_name(name);
        }
    }

    pub fn set_item_param_value(&mut self, idx: usize, param_idx: usize, value: &str) {
        if let Some(param) = self.item_param_mut(idx, param_idx) {
            param.set_value(value);
        }
    }

    pub fn remove_item_param(&mut self, idx: usize, param_idx: usize) {
        if let Some(item) = self.item_mut(idx) {
            if param_idx < item.parameters.len() {
                item.parameters.remove(param_idx);
            }
        }
    }

    fn item_mut(&mut self, idx: usize) -> Option<&mut Item> {
        self.items.as_mut().and_then(|items| items.get_mut(idx))
    }

    fn item_param_mut(&mut self, idx: usize, param_idx: usize) -> Option<&mut Parameter> {
        self.item_mut(idx)
            .and_then(|item| item.parameters.get_mut(param_idx))
    }

    // == User properties ==

    pub fn add_user_property(&mut self, param: Parameter) {
        self.user_properties.push(param);
    }

    pub fn set_user_property_name(&mut self, idx: usize, name: &str) {
        if let Some(param) = self.user_properties.get_mut(idx) {
            param.set_name(name);
        }
    }

    pub fn set_user_property_value(&mut self, idx: usize, value: &str) {
        if let Some(param) = self.user_properties.get_mut(idx) {
            param.set_value(value);
        }
    }

    pub fn remove_user_property(&mut self, idx: usize) {
        if idx < self.user_properties.len() {
            self.user_properties.remove(idx);
        }
    }
}
