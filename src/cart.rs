//! # Cart view
//!
//! Turns the raw remote cart into the grouping the storefront renders: one
//! block per package, products grouped under their resolved category name.
//! Mutations never patch local state; the routes issue the remote call,
//! await it, then re-read the canonical cart.

use tracing::warn;

use crate::models::{Cart, CartProduct};

/// Display grouping of one package.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PackageView {
    pub package: String,
    pub price: f64,
    pub guests: Option<u32>,
    pub groups: Vec<CategoryGroup>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub products: Vec<CartProduct>,
}

/// What a decrement actually means for the remote cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    Edit(u32),
    Remove,
}

/// Decrementing a line item at quantity 1 removes it; never zero, never
/// negative.
pub fn decrement_action(quantity: u32) -> CartMutation {
    if quantity > 1 {
        CartMutation::Edit(quantity - 1)
    } else {
        CartMutation::Remove
    }
}

pub fn group_packages(cart: &Cart) -> Vec<PackageView> {
    cart.order
        .iter()
        .map(|package| {
            let mut groups: Vec<CategoryGroup> = Vec::new();

            // Categories the menu echo knows come first, in menu order.
            if let Some(menu) = &cart.menu {
                for content in &menu.contents {
                    let mut products = Vec::new();
                    for id in &content.ids {
                        if let Some(items) = package.products.get(&id.to_string()) {
                            products.extend(items.iter().cloned());
                        }
                    }
                    if !products.is_empty() {
                        groups.push(CategoryGroup {
                            name: content.name.clone(),
                            products,
                        });
                    }
                }
            }

            // Whatever the echo does not cover falls back to the static
            // table, then to "Other".
            for (category_id, products) in &package.products {
                let covered = cart.menu.as_ref().is_some_and(|menu| {
                    menu.contents
                        .iter()
                        .any(|c| c.ids.iter().any(|id| id.to_string() == *category_id))
                });
                if covered {
                    continue;
                }

                let name = resolve_fallback_name(category_id, &package.package);
                match groups.iter_mut().find(|group| group.name == name) {
                    Some(group) => group.products.extend(products.iter().cloned()),
                    None => groups.push(CategoryGroup {
                        name,
                        products: products.clone(),
                    }),
                }
            }

            PackageView {
                package: package.package.clone(),
                price: package.price,
                guests: package.guests,
                groups,
            }
        })
        .collect()
}

/// Resolution when the live menu echo does not know the category: static
/// per-package table, then "Other". The echo is the source of truth; a
/// fallback hit is logged so drift between the table and the backend
/// surfaces in the logs.
fn resolve_fallback_name(category_id: &str, package_name: &str) -> String {
    if let Some(name) = fallback_category(package_name, category_id) {
        warn!(package_name, category_id, "category resolved via static fallback table");
        return name.to_string();
    }

    warn!(package_name, category_id, "category unknown, grouping under Other");
    "Other".to_string()
}

/// Last-resort category names for menus whose echo the backend drops.
fn fallback_category(package_name: &str, category_id: &str) -> Option<&'static str> {
    let table: &[(&str, &str)] = match package_name {
        "Catering Menü Klassik" => &[
            ("61", "Vorspeise"),
            ("62", "Hauptgericht"),
            ("63", "Beilagen"),
            ("64", "Dessert"),
        ],
        "Catering Menü Premium" => &[
            ("71", "Vorspeise"),
            ("72", "Hauptgericht"),
            ("73", "Beilagen"),
            ("74", "Dessert"),
            ("75", "Extras"),
        ],
        "Fingerfood Buffet" => &[("81", "Fingerfood"), ("82", "Dips"), ("83", "Extras")],
        _ => return None,
    };

    table
        .iter()
        .find(|(id, _)| *id == category_id)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(json: &str) -> Cart {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decrement_above_one_edits() {
        assert_eq!(decrement_action(3), CartMutation::Edit(2));
    }

    #[test]
    fn decrement_at_one_removes() {
        assert_eq!(decrement_action(1), CartMutation::Remove);
        assert_eq!(decrement_action(0), CartMutation::Remove);
    }

    #[test]
    fn products_group_under_menu_echo_names() {
        let cart = cart(
            r#"{
                "order":[{"package":"Catering Menü Klassik","price":25,"guests":2,"products":{
                    "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":2,"price":0,"total":0}],
                    "62":[{"cart_id":"2","product_id":"8","name":"Adana","quantity":2,"price":0,"total":0}]
                }}],
                "menu":{"name":"Catering Menü Klassik","contents":[
                    {"name":"Vorspeise","ids":[61],"count":2},
                    {"name":"Hauptgericht","ids":[62],"count":2}
                ]}
            }"#,
        );

        let views = group_packages(&cart);
        assert_eq!(views.len(), 1);
        let names: Vec<_> = views[0].groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Vorspeise", "Hauptgericht"]);
    }

    #[test]
    fn unknown_category_without_fallback_lands_in_other() {
        let cart = cart(
            r#"{"order":[{"package":"Sonderpaket","price":10,"products":{
                "999":[{"cart_id":"1","product_id":"7","name":"X","quantity":1,"price":0,"total":0}]
            }}]}"#,
        );

        let views = group_packages(&cart);
        assert_eq!(views[0].groups[0].name, "Other");
    }

    #[test]
    fn fallback_table_covers_known_packages_without_echo() {
        let cart = cart(
            r#"{"order":[{"package":"Catering Menü Klassik","price":25,"products":{
                "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":1,"price":0,"total":0}]
            }}]}"#,
        );

        let views = group_packages(&cart);
        assert_eq!(views[0].groups[0].name, "Vorspeise");
    }

    #[test]
    fn keyed_and_sequence_orders_group_identically() {
        let seq = cart(
            r#"{"order":[{"package":"Catering Menü Klassik","price":25,"products":{
                "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":1,"price":0,"total":0}]
            }}]}"#,
        );
        let map = cart(
            r#"{"order":{"5":{"package":"Catering Menü Klassik","price":25,"products":{
                "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":1,"price":0,"total":0}]
            }}}}"#,
        );

        let a = group_packages(&seq);
        let b = group_packages(&map);
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].groups[0].name, b[0].groups[0].name);
        assert_eq!(a[0].groups[0].products.len(), b[0].groups[0].products.len());
    }
}
