//! Host-site paths shared by the router and the redirect/URL builders.

use crate::domain::id::OrderNumber;
use uuid::Uuid;

pub const BASKET_SUMMARY: &str = "/basket";
pub const SHIPPING_ADDRESS_FORM: &str = "/checkout/shipping-address";
pub const SHIPPING_METHOD_FORM: &str = "/checkout/shipping-method";
pub const THANK_YOU: &str = "/checkout/thank-you";

pub fn success_return(basket_id: Uuid) -> String {
    format!("/checkout/paypal/success/{basket_id}")
}

pub fn cancel_return(basket_id: Uuid) -> String {
    format!("/checkout/paypal/cancel/{basket_id}")
}

pub fn shipping_options(basket_id: Uuid) -> String {
    format!("/checkout/paypal/shipping-options/{basket_id}")
}

pub fn payment(order_number: &OrderNumber) -> String {
    format!("/checkout/paypal/payment/{order_number}")
}

pub fn order_status(order_number: &OrderNumber) -> String {
    format!("/accounts/orders/{order_number}")
}
