//! # Order document
//!
//! Builds the line-itemized order PDF attached to the confirmation mails:
//! header, customer block, one table block per package with its category
//! groups, per-package subtotal, grand total, footer. Layout is a simple
//! top-down cursor; a new page starts whenever a block would not fit.

use anyhow::Result;
use chrono::Local;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::cart;
use crate::models::{Cart, CustomerInfo};
use crate::totals::{self, format_eur};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const BOTTOM: f32 = 25.0;

const COL_QUANTITY: f32 = 130.0;
const COL_PRICE: f32 = 165.0;

struct Sheet<'a> {
    doc: &'a PdfDocumentReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
}

impl Sheet<'_> {
    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < BOTTOM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Folgeseite");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    fn rule(&self) {
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y)), false),
            ],
            is_closed: false,
        };
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.86, 0.86, 0.86, None)));
        self.layer.set_outline_thickness(0.3);
        self.layer.add_line(line);
    }
}

pub fn generate_order_pdf(
    cart_data: &Cart,
    customer: &CustomerInfo,
    order_number: &str,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Catering-Auftrag",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Seite 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let first = doc.get_page(page).get_layer(layer);

    let mut sheet = Sheet {
        doc: &doc,
        regular: &regular,
        bold: &bold,
        layer: first,
        y: PAGE_HEIGHT - MARGIN,
    };

    sheet.text("Hardal Restaurant", 16.0, MARGIN, true);
    sheet.advance(6.0);
    sheet.text("Catering-Auftrag", 12.0, MARGIN, false);
    sheet.advance(10.0);

    sheet.text(&format!("Bestellnummer: {order_number}"), 10.0, MARGIN, false);
    sheet.advance(5.0);
    sheet.text(
        &format!("Datum: {}", Local::now().format("%d.%m.%Y")),
        10.0,
        MARGIN,
        false,
    );
    sheet.advance(11.0);

    sheet.text("Kundeninformationen", 11.0, MARGIN + 5.0, true);
    sheet.advance(6.0);
    for line in [
        format!("{} {}", customer.first_name, customer.last_name),
        customer.address.clone(),
        format!("{} {}", customer.postal_code, customer.city),
        format!("Tel: {}", customer.phone),
        format!("Email: {}", customer.email),
    ] {
        sheet.text(&line, 10.0, MARGIN + 5.0, false);
        sheet.advance(5.0);
    }
    sheet.advance(6.0);

    sheet.text("Bestelldetails", 12.0, MARGIN, true);
    sheet.advance(7.0);

    sheet.text("Artikel", 10.0, MARGIN, true);
    sheet.text("Menge", 10.0, COL_QUANTITY, true);
    sheet.text("Preis", 10.0, COL_PRICE, true);
    sheet.advance(2.0);
    sheet.rule();
    sheet.advance(6.0);

    let views = cart::group_packages(cart_data);
    let mut grand_total = 0.0;

    for (package, view) in cart_data.order.iter().zip(views.iter()) {
        sheet.ensure_room(14.0);

        let header = match package.guests {
            Some(guests) => format!("{} ({guests} Gäste)", view.package),
            None => view.package.clone(),
        };
        sheet.text(&header, 11.0, MARGIN, true);
        sheet.text(&format_eur(package.price), 11.0, COL_PRICE, true);
        sheet.advance(6.0);

        for group in &view.groups {
            for product in &group.products {
                sheet.ensure_room(6.0);
                let price = if product.total > 0.0 {
                    format_eur(product.total)
                } else {
                    format_eur(product.price)
                };
                sheet.text(&product.name, 9.0, MARGIN, false);
                sheet.text(&product.quantity.to_string(), 9.0, COL_QUANTITY, false);
                sheet.text(&price, 9.0, COL_PRICE, false);
                sheet.advance(5.0);
            }
        }

        let package_total = totals::package_base(package) + totals::package_extras(package);
        grand_total += package_total;

        sheet.ensure_room(9.0);
        sheet.text("Zwischensumme", 10.0, MARGIN, true);
        sheet.text(&format_eur(package_total), 10.0, COL_PRICE, true);
        sheet.advance(3.0);
        sheet.rule();
        sheet.advance(7.0);
    }

    sheet.ensure_room(12.0);
    sheet.advance(2.0);
    sheet.text(
        &format!("Gesamtbetrag: {}", format_eur(grand_total)),
        11.0,
        MARGIN + 5.0,
        true,
    );

    sheet.y = 10.0;
    sheet.text(
        "Hardal Restaurant | Möllner Landstraße 3, 22111 Hamburg | Tel: +49 408 470 82 | Email: info@hardal-restaurant.de",
        8.0,
        MARGIN,
        false,
    );

    drop(sheet);
    Ok(doc.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_pdf_renders_to_a_nonempty_document() {
        let cart: Cart = serde_json::from_str(
            r#"{
                "order":[{"package":"Catering Menü Klassik","price":25,"guests":4,"products":{
                    "61":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":4,"price":0,"total":0}],
                    "62":[{"cart_id":"2","product_id":"9","name":"Baklava","quantity":10,"price":0.75,"total":7.5}]
                }}],
                "menu":{"name":"Catering Menü Klassik","contents":[
                    {"name":"Vorspeise","ids":[61],"count":2},
                    {"name":"Dessert","ids":[62],"count":1}
                ]}
            }"#,
        )
        .unwrap();
        let customer = CustomerInfo {
            first_name: "Ayse".to_string(),
            last_name: "Yilmaz".to_string(),
            email: "ayse@example.de".to_string(),
            phone: "+49 40 123456".to_string(),
            address: "Möllner Landstraße 3".to_string(),
            city: "Hamburg".to_string(),
            postal_code: "22111".to_string(),
        };

        let bytes = generate_order_pdf(&cart, &customer, "ORD-123456").unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..5], b"%PDF-");
    }
}
