use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CheckoutId);
id_newtype!(CartId);
id_newtype!(LineItemId);
id_newtype!(ConsignmentId);

/// Checkout steps in canonical order. `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Customer,
    Shipping,
    Billing,
    Payment,
}

impl StepType {
    pub const ALL: [StepType; 4] = [
        StepType::Customer,
        StepType::Shipping,
        StepType::Billing,
        StepType::Payment,
    ];

    /// Lowercase canonical name, as reported to analytics.
    pub fn name(self) -> &'static str {
        match self {
            StepType::Customer => "customer",
            StepType::Shipping => "shipping",
            StepType::Billing => "billing",
            StepType::Payment => "payment",
        }
    }

    /// Steps whose completeness is derived from customer data and must be
    /// re-confirmed after the customer changes.
    pub fn depends_on_customer(self) -> bool {
        matches!(self, StepType::Billing | StepType::Payment)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub step_type: StepType,
    pub is_required: bool,
    pub is_complete: bool,
    pub is_active: bool,
    pub is_editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerViewType {
    #[default]
    Guest,
    Login,
    CreateAccount,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<Cart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<Checkout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consignments: Option<Vec<Consignment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<StoreConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl CheckoutSnapshot {
    pub fn has_physical_items(&self) -> bool {
        self.cart
            .as_ref()
            .is_some_and(|cart| !cart.line_items.physical_items.is_empty())
    }

    pub fn is_cart_empty(&self) -> bool {
        self.cart.as_ref().map_or(true, Cart::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub line_items: LineItems,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.line_items.physical_items.is_empty()
            && self.line_items.digital_items.is_empty()
            && self.line_items.gift_certificates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItems {
    #[serde(default)]
    pub physical_items: Vec<LineItem>,
    #[serde(default)]
    pub digital_items: Vec<LineItem>,
    #[serde(default)]
    pub gift_certificates: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub category_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: CheckoutId,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    #[serde(default)]
    pub grand_total: f64,
    #[serde(default)]
    pub is_store_credit_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(default)]
    pub banners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_guest: bool,
    #[serde(default)]
    pub store_credit: f64,
}

impl Customer {
    pub fn is_signed_in(&self) -> bool {
        !self.is_guest
    }

    /// A guest who has submitted an email has chosen guest checkout.
    pub fn has_continued_as_guest(&self) -> bool {
        self.is_guest && self.email.as_deref().is_some_and(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consignment {
    pub id: ConsignmentId,
    #[serde(default)]
    pub line_item_ids: Vec<LineItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_shipping_option: Option<ShippingOption>,
}

impl Consignment {
    pub fn is_ready(&self) -> bool {
        self.shipping_address.is_some() && self.selected_shipping_option.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub checkout_settings: CheckoutSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSettings {
    #[serde(default)]
    pub guest_checkout_enabled: bool,
    #[serde(default)]
    pub has_multi_shipping_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    #[serde(default)]
    pub is_complete: bool,
}
