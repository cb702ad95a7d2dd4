//! # Routes
//!
//! Thin handlers. Each mutating handler performs exactly one remote call;
//! the canonical cart is always re-read afterwards (here or by the caller's
//! follow-up fetch), never patched locally. Remote failures surface as
//! retryable errors and leave every local state machine untouched.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use crate::cart::{self, CartMutation};
use crate::checkout::CheckoutWizard;
use crate::error::AppError;
use crate::models::{
    AddExtraRequest, AddProductRequest, Address, CartEnvelope, CategoryRequest, CustomerInfo,
    EditProductRequest, FlowJumpRequest, FlowSnapshot, FlowStartRequest, MenuContent,
    MenuContentRequest, MenuContentResponse, PaymentMethodRequest, ProductByIdRequest,
    ProductsResponse, RemoveProductRequest, ShippingMethodRequest, SubmitOrderRequest,
    SubmitOrderResponse,
};
use crate::session::session_token;
use crate::state::State as AppState;
use crate::steps::{self, Advance, StepFlow};
use crate::{email, pdf, totals};

// Catalog and cart passthroughs.

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CartEnvelope>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_cart(&token).await?))
}

pub async fn get_menu_content(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<MenuContentRequest>,
) -> Result<Json<MenuContentResponse>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_menu_content(&token, payload.menu).await?))
}

pub async fn get_categories(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_categories(&token).await?))
}

pub async fn get_packages(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_packages(&token).await?))
}

pub async fn get_products_by_category(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<ProductsResponse>, AppError> {
    let token = session_token(&jar)?;
    let products = state
        .commerce
        .get_products_by_category(&token, &payload.category_id)
        .await?;
    Ok(Json(products))
}

pub async fn get_product_by_id(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ProductByIdRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_product_by_id(&token, &payload.product_id).await?))
}

pub async fn add_main_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<AddProductRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(
        state
            .commerce
            .add_main_product(&token, &payload.id, payload.quantity)
            .await?,
    ))
}

pub async fn edit_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<EditProductRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(
        state
            .commerce
            .edit_product(&token, &payload.id, payload.quantity)
            .await?,
    ))
}

/// Decrement one line item. At quantity 1 this is a removal, never a zero
/// or negative quantity.
pub async fn decrement_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<EditProductRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let response = match cart::decrement_action(payload.quantity) {
        CartMutation::Edit(quantity) => {
            state.commerce.edit_product(&token, &payload.id, quantity).await?
        }
        CartMutation::Remove => state.commerce.remove_product(&token, &payload.id).await?,
    };
    Ok(Json(response))
}

pub async fn remove_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RemoveProductRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.remove_product(&token, &payload.id).await?))
}

pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.clear_cart(&token).await?))
}

pub async fn add_package(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.add_package(&token).await?))
}

pub async fn delete_package(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.delete_package(&token).await?))
}

pub async fn add_extra(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<AddExtraRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.add_extra(&token, &payload.product_id).await?))
}

/// Display-ready cart: packages grouped by resolved category name, plus
/// locally computed totals.
pub async fn cart_view(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let envelope = state.commerce.get_cart(&token).await?;

    let packages = cart::group_packages(&envelope.cart);
    let totals = totals::cart_totals(&envelope.cart.order);

    Ok(Json(serde_json::json!({
        "packages": packages,
        "subTotal": totals.sub_total,
        "extrasTotal": totals.extras_total,
        "totalPrice": totals.total_price,
    })))
}

// Checkout wizard. Each step commits one field remotely, then records the
// value locally and advances; a remote failure returns before either.

pub async fn get_payment_methods(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_payment_methods(&token).await?))
}

pub async fn set_payment_method(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<PaymentMethodRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let response = state
        .commerce
        .set_payment_method(&token, &payload.payment_method)
        .await?;

    let mut checkouts = state.checkouts.write().await;
    checkouts
        .entry(token)
        .or_default()
        .commit_payment_method(payload.payment_method);
    Ok(Json(response))
}

pub async fn set_shipping_address(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<Address>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let response = state.commerce.set_shipping_address(&token, &payload).await?;

    let mut checkouts = state.checkouts.write().await;
    checkouts.entry(token).or_default().commit_shipping_address(payload);
    Ok(Json(response))
}

pub async fn set_payment_address(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<Address>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let response = state.commerce.set_payment_address(&token, &payload).await?;

    let mut checkouts = state.checkouts.write().await;
    checkouts.entry(token).or_default().commit_payment_address(payload);
    Ok(Json(response))
}

pub async fn get_shipping_method(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(state.commerce.get_shipping_method(&token).await?))
}

pub async fn set_shipping_method(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ShippingMethodRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    let response = state
        .commerce
        .set_shipping_method(&token, &payload.shipping_method)
        .await?;

    let mut checkouts = state.checkouts.write().await;
    checkouts
        .entry(token)
        .or_default()
        .commit_shipping_method(payload.shipping_method);
    Ok(Json(response))
}

pub async fn checkout_state(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CheckoutWizard>, AppError> {
    let token = session_token(&jar)?;
    let checkouts = state.checkouts.read().await;
    let wizard = checkouts.get(&token).cloned().unwrap_or_default();
    Ok(Json(wizard))
}

/// Back never undoes the previously committed remote value; revisiting and
/// resubmitting a step overwrites it.
pub async fn checkout_back(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CheckoutWizard>, AppError> {
    let token = session_token(&jar)?;
    let mut checkouts = state.checkouts.write().await;
    let wizard = checkouts.entry(token).or_default();
    wizard.back();
    Ok(Json(wizard.clone()))
}

pub async fn checkout_confirm(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CheckoutWizard>, AppError> {
    let token = session_token(&jar)?;
    let mut checkouts = state.checkouts.write().await;
    let wizard = checkouts.entry(token).or_default();
    wizard.confirm();
    Ok(Json(wizard.clone()))
}

// Configurator flow. The step machine lives server-side, keyed by session;
// every snapshot recomputes the active category's count from the refreshed
// cart, so the modal edge-trigger observes mutations made through any of
// the cart routes above.

struct Gate {
    total_steps: usize,
    category: MenuContent,
    current: u32,
}

async fn read_flow(state: &AppState, token: &str) -> Result<(u32, usize), AppError> {
    let flows = state.flows.read().await;
    let flow = flows.get(token).ok_or(AppError::NoFlow)?;
    Ok((flow.menu_id, flow.step()))
}

async fn gate(state: &AppState, token: &str) -> Result<Gate, AppError> {
    let (menu_id, step) = read_flow(state, token).await?;

    let contents = state.commerce.get_menu_content(token, menu_id).await?.contents;
    if contents.is_empty() {
        return Err(AppError::Validation("Keine Menüinhalte gefunden.".to_string()));
    }

    let step = if step < contents.len() { step } else { 0 };
    let category = contents[step].clone();

    let mut valid_product_ids = HashSet::new();
    for id in &category.ids {
        let products = state
            .commerce
            .get_products_by_category(token, &id.to_string())
            .await?;
        valid_product_ids.extend(products.products.into_iter().map(|p| p.product_id));
    }

    let envelope = state.commerce.get_cart(token).await?;
    let current = steps::selected_count(&category, &envelope, &valid_product_ids);

    Ok(Gate {
        total_steps: contents.len(),
        category,
        current,
    })
}

/// Reconcile the flow against the live cart and report it. Runs the
/// edge-trigger, so a crossing observed here opens the modal exactly once.
async fn snapshot(state: &AppState, token: &str) -> Result<FlowSnapshot, AppError> {
    let gate = gate(state, token).await?;

    let mut flows = state.flows.write().await;
    let flow = flows.get_mut(token).ok_or(AppError::NoFlow)?;
    flow.clamp(gate.total_steps);
    flow.observe_category(&gate.category.name, gate.current, gate.category.count);

    Ok(FlowSnapshot {
        step: flow.step(),
        total_steps: gate.total_steps,
        category: gate.category.name,
        required: gate.category.count,
        current: gate.current,
        modal_open: flow.modal_open(),
        completed: false,
    })
}

pub async fn flow_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<FlowStartRequest>,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;

    let mut flows = state.flows.write().await;
    flows.insert(token.clone(), StepFlow::new(payload.menu, payload.guests.max(1)));
    drop(flows);

    Ok(Json(snapshot(&state, &token).await?))
}

pub async fn flow_state(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(snapshot(&state, &token).await?))
}

async fn advance_flow(state: &AppState, token: &str) -> Result<FlowSnapshot, AppError> {
    let gate = gate(state, token).await?;

    let advance = {
        let mut flows = state.flows.write().await;
        let flow = flows.get_mut(token).ok_or(AppError::NoFlow)?;
        flow.clamp(gate.total_steps);
        flow.advance(gate.total_steps, &gate.category.name, gate.category.count, gate.current)
    };

    match advance {
        Advance::Blocked(message) => Err(AppError::Validation(message)),
        Advance::Advanced(_) => snapshot(state, token).await,
        Advance::Finalize => {
            // Commit the package first; a failure keeps the flow intact so
            // the action can simply be retried.
            state.commerce.add_package(token).await?;
            state.flows.write().await.remove(token);
            info!("package committed, configurator flow finished");

            Ok(FlowSnapshot {
                step: gate.total_steps - 1,
                total_steps: gate.total_steps,
                category: gate.category.name,
                required: gate.category.count,
                current: gate.current,
                modal_open: false,
                completed: true,
            })
        }
    }
}

pub async fn flow_next(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;
    Ok(Json(advance_flow(&state, &token).await?))
}

pub async fn flow_previous(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;

    {
        let mut flows = state.flows.write().await;
        let flow = flows.get_mut(&token).ok_or(AppError::NoFlow)?;
        flow.previous();
    }

    Ok(Json(snapshot(&state, &token).await?))
}

pub async fn flow_jump(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<FlowJumpRequest>,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;
    let gate = gate(&state, &token).await?;
    let gate_satisfied = gate.current >= gate.category.count;

    let allowed = {
        let mut flows = state.flows.write().await;
        let flow = flows.get_mut(&token).ok_or(AppError::NoFlow)?;
        flow.clamp(gate.total_steps);
        flow.jump_to(payload.step, gate.total_steps, gate_satisfied)
    };

    if !allowed {
        return Err(AppError::Validation(
            "Dieser Schritt ist noch nicht erreichbar.".to_string(),
        ));
    }

    Ok(Json(snapshot(&state, &token).await?))
}

/// Remember which product the upsell modal offers as an extra.
pub async fn flow_select_extra(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<AddExtraRequest>,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;

    let mut flows = state.flows.write().await;
    let flow = flows.get_mut(&token).ok_or(AppError::NoFlow)?;
    flow.selected_extra = Some(payload.product_id);

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn flow_modal_add_extra(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;

    let product_id = {
        let flows = state.flows.read().await;
        let flow = flows.get(&token).ok_or(AppError::NoFlow)?;
        flow.selected_extra
            .clone()
            .ok_or_else(|| AppError::Validation("Kein Produkt ausgewählt".to_string()))?
    };

    let response = state.commerce.add_extra(&token, &product_id).await?;

    let mut flows = state.flows.write().await;
    if let Some(flow) = flows.get_mut(&token) {
        flow.selected_extra = None;
        flow.close_modal();
    }

    Ok(Json(response))
}

pub async fn flow_modal_advance(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<FlowSnapshot>, AppError> {
    let token = session_token(&jar)?;

    {
        let mut flows = state.flows.write().await;
        let flow = flows.get_mut(&token).ok_or(AppError::NoFlow)?;
        flow.close_modal();
    }

    Ok(Json(advance_flow(&state, &token).await?))
}

/// Abandon the configurator; per-menu progress does not outlive the flow.
pub async fn flow_abandon(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Value>, AppError> {
    let token = session_token(&jar)?;
    state.flows.write().await.remove(&token);
    Ok(Json(serde_json::json!({ "success": true })))
}

// Order submission: PDF + emails, fire-and-forget from the cart's point of
// view. Nothing is rolled back on failure; the user retries the action.

fn order_number() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(6)..];
    format!("ORD-{tail}")
}

pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitOrderRequest>,
) -> Result<Json<SubmitOrderResponse>, AppError> {
    let order_number = order_number();
    let SubmitOrderRequest {
        customer_info,
        cart_data,
    } = payload;

    let document = build_order_pdf(&cart_data.cart, &customer_info, &order_number)?;
    email::send_order_emails(&state.config, document, &customer_info, &order_number).await?;

    info!(%order_number, "order processed");
    Ok(Json(SubmitOrderResponse {
        success: true,
        message: "Order processed successfully".to_string(),
        order_number,
    }))
}

fn build_order_pdf(
    cart: &crate::models::Cart,
    customer: &CustomerInfo,
    order_number: &str,
) -> Result<Vec<u8>, AppError> {
    pdf::generate_order_pdf(cart, customer, order_number).map_err(|e| {
        error!("order PDF generation failed: {e}");
        AppError::Internal(e)
    })
}
