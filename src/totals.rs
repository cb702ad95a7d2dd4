//! # Cart totals
//!
//! Derives subtotal, extras and grand total from a normalized cart snapshot.
//! The backend sends its own formatted totals, but the order document and the
//! review step compute them locally: package base price times guest count,
//! plus every extra line item nested anywhere inside the package.

use crate::models::{LineKind, PackageOrder};

#[derive(Debug, Clone, PartialEq)]
pub struct CartTotals {
    pub sub_total: String,
    pub extras_total: String,
    pub total_price: String,
}

/// Two decimals, trailing currency symbol, no grouping.
pub fn format_eur(value: f64) -> String {
    format!("{value:.2}€")
}

/// Base price of one package: per-guest price times guest count.
pub fn package_base(package: &PackageOrder) -> f64 {
    package.price * f64::from(package.guests.unwrap_or(1))
}

/// Sum of the extra line items nested in one package.
pub fn package_extras(package: &PackageOrder) -> f64 {
    package
        .products
        .values()
        .flatten()
        .filter(|product| product.kind == LineKind::Extra)
        .map(|product| product.total)
        .sum()
}

pub fn cart_totals(packages: &[PackageOrder]) -> CartTotals {
    let sub_total: f64 = packages.iter().map(package_base).sum();
    let extras_total: f64 = packages.iter().map(package_extras).sum();

    CartTotals {
        sub_total: format_eur(sub_total),
        extras_total: format_eur(extras_total),
        total_price: format_eur(sub_total + extras_total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cart;

    fn cart(json: &str) -> Cart {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_cart_formats_to_zero() {
        let totals = cart_totals(&[]);
        assert_eq!(totals.sub_total, "0.00€");
        assert_eq!(totals.extras_total, "0.00€");
        assert_eq!(totals.total_price, "0.00€");
    }

    #[test]
    fn package_with_guests_and_one_extra() {
        // 25€ × 4 guests plus a 7.50€ extra.
        let cart = cart(
            r#"{"order":[{
                "package":"Menü Klassik","price":25,"guests":4,
                "products":{
                    "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":4,"price":0,"total":0}],
                    "62":[{"cart_id":"2","product_id":"9","name":"Baklava","quantity":10,"price":0.75,"total":7.5}]
                }
            }]}"#,
        );

        let totals = cart_totals(&cart.order);
        assert_eq!(totals.sub_total, "100.00€");
        assert_eq!(totals.extras_total, "7.50€");
        assert_eq!(totals.total_price, "107.50€");
    }

    #[test]
    fn missing_guest_count_defaults_to_one() {
        let cart = cart(r#"{"order":[{"package":"Menü","price":25,"products":{}}]}"#);
        assert_eq!(cart_totals(&cart.order).total_price, "25.00€");
    }

    #[test]
    fn keyed_object_order_totals_match_sequence_form() {
        let seq = cart(
            r#"{"order":[
                {"package":"A","price":10,"guests":2,"products":{}},
                {"package":"B","price":15,"guests":1,"products":{}}
            ]}"#,
        );
        let map = cart(
            r#"{"order":{
                "1":{"package":"A","price":10,"guests":2,"products":{}},
                "2":{"package":"B","price":15,"guests":1,"products":{}}
            }}"#,
        );

        assert_eq!(cart_totals(&seq.order), cart_totals(&map.order));
        assert_eq!(cart_totals(&seq.order).total_price, "35.00€");
    }
}
