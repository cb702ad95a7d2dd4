//! # Order mails
//!
//! Two messages per submitted order: a notification to the operator and a
//! confirmation to the customer, both with the order PDF attached.

use anyhow::Result;
use lettre::message::{header::ContentType, Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::Config;
use crate::models::CustomerInfo;

fn mailer(config: &Config) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let credentials = Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone());
    Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        .credentials(credentials)
        .build())
}

fn pdf_attachment(order_number: &str, pdf: Vec<u8>) -> Result<SinglePart> {
    Ok(Attachment::new(format!("Bestellung-{order_number}.pdf"))
        .body(pdf, ContentType::parse("application/pdf")?))
}

pub async fn send_order_emails(
    config: &Config,
    pdf: Vec<u8>,
    customer: &CustomerInfo,
    order_number: &str,
) -> Result<()> {
    let mailer = mailer(config)?;

    let operator_body = format!(
        "<h2>Neue Bestellung eingegangen</h2>\
         <p>Bestellnummer: {order_number}</p>\
         <h3>Kundeninformationen:</h3>\
         <p>Name: {first} {last}<br>\
         Email: {email}<br>\
         Telefon: {phone}<br>\
         Adresse: {address}<br>\
         {postal_code} {city}</p>",
        first = customer.first_name,
        last = customer.last_name,
        email = customer.email,
        phone = customer.phone,
        address = customer.address,
        postal_code = customer.postal_code,
        city = customer.city,
    );

    let operator_mail = Message::builder()
        .from(config.smtp_from.parse()?)
        .to(config.operator_email.parse()?)
        .subject(format!("Neue Bestellung #{order_number}"))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(operator_body))
                .singlepart(pdf_attachment(order_number, pdf.clone())?),
        )?;

    let customer_body = format!(
        "<h2>Vielen Dank für Ihre Bestellung!</h2>\
         <p>Ihre Bestellnummer: {order_number}</p>\
         <p>Wir haben Ihre Bestellung erhalten und werden sie schnellstmöglich bearbeiten.</p>"
    );

    let customer_mail = Message::builder()
        .from(config.smtp_from.parse()?)
        .to(customer.email.parse()?)
        .subject(format!("Ihre Bestellung #{order_number} bei Hardal Restaurant"))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(customer_body))
                .singlepart(pdf_attachment(order_number, pdf)?),
        )?;

    mailer.send(operator_mail).await?;
    mailer.send(customer_mail).await?;

    info!(order_number, "order mails sent");
    Ok(())
}
