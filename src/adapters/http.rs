//! Axum entry points for the five checkout endpoints, plus the mapping
//! from typed phase outcomes to concrete redirect URLs.

use {
    super::api_errors::ApiError,
    super::nvp,
    crate::AppState,
    crate::domain::{
        context::SessionContext,
        id::{OrderNumber, PayerId, Token},
        money::{Amount, Currency, Money},
        outcome::{Destination, PaymentArgs, PhaseOutcome, SuccessReturn},
    },
    crate::routes,
    crate::services::shipping_options::{self, CallbackRequest, ShippingOptionsReply},
    axum::{
        Form, Json,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Redirect, Response},
    },
    serde::Deserialize,
    uuid::Uuid,
};

#[derive(Debug, Deserialize)]
pub struct BeginQuery {
    #[serde(default)]
    pub as_payment_method: bool,
}

/// Phase A. The host shop normally supplies the buyer's session here; the
/// reference wiring runs anonymous and leans on the pre-auth snapshot for
/// the return leg.
pub async fn begin(
    State(state): State<AppState>,
    Path(basket_id): Path<Uuid>,
    Query(query): Query<BeginQuery>,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::anonymous();
    let outcome = state
        .checkout
        .initiate(basket_id, query.as_payment_method, &ctx)
        .await?;
    Ok(redirect_response(outcome))
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub token: Option<String>,
}

/// Phase B.
pub async fn cancel_return(
    State(state): State<AppState>,
    Path(basket_id): Path<Uuid>,
    Query(query): Query<CancelQuery>,
) -> Result<Response, ApiError> {
    let outcome = state
        .checkout
        .handle_cancel(basket_id, query.token.as_deref())
        .await?;
    Ok(redirect_response(outcome))
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub token: Option<String>,
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

/// Phase C, GET: preview payload or a redirect.
pub async fn success_return(
    State(state): State<AppState>,
    Path(basket_id): Path<Uuid>,
    Query(query): Query<ReturnQuery>,
) -> Result<Response, ApiError> {
    let result = state
        .checkout
        .handle_success_return(basket_id, query.token.as_deref(), query.payer_id.as_deref())
        .await?;
    Ok(match result {
        SuccessReturn::Preview(preview) => Json(preview).into_response(),
        SuccessReturn::Redirect(outcome) => redirect_response(outcome),
    })
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    pub payer_id: Option<String>,
    pub token: Option<String>,
    /// Terms-of-service checkbox; present when ticked.
    pub terms: Option<String>,
}

/// Phase C, POST: place the order from the confirmed preview.
pub async fn place_order(
    State(state): State<AppState>,
    Path(basket_id): Path<Uuid>,
    Form(form): Form<PlaceOrderForm>,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::anonymous();
    let outcome = state
        .checkout
        .submit_preview(
            basket_id,
            form.token.as_deref(),
            form.payer_id.as_deref(),
            form.terms.is_some(),
            &ctx,
        )
        .await?;
    Ok(redirect_response(outcome))
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub payer_id: String,
    pub token: String,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
}

/// Phase D.
pub async fn handle_payment(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<PaymentQuery>,
) -> Result<Response, ApiError> {
    let args = PaymentArgs {
        order_number: OrderNumber::new(order_number)?,
        amount: Money::new(
            Amount::new(query.amount)?,
            Currency::try_from(query.currency.as_str())?,
        ),
        token: Token::new(query.token)?,
        payer_id: PayerId::new(query.payer_id)?,
    };
    let outcome = state.checkout.handle_payment(&args).await?;
    Ok(redirect_response(outcome))
}

/// Server-to-server shipping-options callback. Always answers 200 with a
/// well-formed NVP document for a known basket; 404 only when the basket
/// id itself is unknown.
pub async fn shipping_options(
    State(state): State<AppState>,
    Path(basket_id): Path<Uuid>,
    body: String,
) -> Response {
    let fields = nvp::decode(&body);
    let request = CallbackRequest {
        country: fields.get("PAYMENTREQUEST_0_SHIPTOCOUNTRY").cloned(),
        street: fields.get("PAYMENTREQUEST_0_SHIPTOSTREET").cloned(),
        street2: fields.get("PAYMENTREQUEST_0_SHIPTOSTREET2").cloned(),
        city: fields.get("PAYMENTREQUEST_0_SHIPTOCITY").cloned(),
        state: fields.get("PAYMENTREQUEST_0_SHIPTOSTATE").cloned(),
        postcode: fields.get("PAYMENTREQUEST_0_SHIPTOZIP").cloned(),
        currency_code: fields.get("CURRENCYCODE").cloned(),
    };

    match shipping_options::shipping_options(
        state.baskets.as_ref(),
        state.shipping.as_ref(),
        basket_id,
        &request,
    )
    .await
    {
        Some(reply) => (StatusCode::OK, encode_callback_response(&reply)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// NVP document the gateway expects back from the callback. Order matters:
/// methods appear in resolver rank, index 0 is flagged as the default.
pub fn encode_callback_response(reply: &ShippingOptionsReply) -> String {
    let mut pairs: Vec<(String, String)> = vec![
        ("METHOD".into(), "CallbackResponse".into()),
        ("CURRENCYCODE".into(), reply.currency_code.clone()),
    ];
    if reply.methods.is_empty() {
        // Nothing deliverable at this destination.
        pairs.push(("NO_SHIPPING_OPTION_DETAILS".into(), "1".into()));
    } else {
        for (index, method) in reply.methods.iter().enumerate() {
            pairs.push((format!("L_SHIPPINGOPTIONNAME{index}"), method.name.clone()));
            pairs.push((format!("L_SHIPPINGOPTIONLABEL{index}"), method.name.clone()));
            pairs.push((
                format!("L_SHIPPINGOPTIONAMOUNT{index}"),
                method.charge.amount().to_wire(),
            ));
            // Tax and insurance are not modelled, but the fields are required.
            pairs.push((format!("L_TAXAMT{index}"), "0.00".into()));
            pairs.push((format!("L_INSURANCEAMT{index}"), "0.00".into()));
            pairs.push((
                format!("L_SHIPPINGOPTIONISDEFAULT{index}"),
                if index == 0 { "1" } else { "0" }.into(),
            ));
        }
    }
    nvp::encode(&pairs)
}

fn redirect_response(outcome: PhaseOutcome) -> Response {
    let mut url = destination_url(&outcome.destination);
    if let Some(flash) = &outcome.message {
        let query = nvp::encode(&[
            ("severity", flash.severity.as_str()),
            ("message", flash.text.as_str()),
        ]);
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    Redirect::to(&url).into_response()
}

fn destination_url(destination: &Destination) -> String {
    match destination {
        Destination::BasketSummary => routes::BASKET_SUMMARY.into(),
        Destination::ShippingAddressForm => routes::SHIPPING_ADDRESS_FORM.into(),
        Destination::ShippingMethodForm => routes::SHIPPING_METHOD_FORM.into(),
        Destination::Preview {
            basket_id,
            token,
            payer_id,
        } => format!(
            "{}?{}",
            routes::success_return(*basket_id),
            nvp::encode(&[("token", token.as_str()), ("PayerID", payer_id.as_str())]),
        ),
        Destination::OrderStatus(number) => routes::order_status(number),
        Destination::Payment(args) => format!(
            "{}?{}",
            routes::payment(&args.order_number),
            nvp::encode(&[
                ("payer_id", args.payer_id.as_str()),
                ("token", args.token.as_str()),
                ("amount", args.amount.amount().to_wire().as_str()),
                ("currency", args.amount.currency().as_str()),
            ]),
        ),
        Destination::Gateway(url) => url.clone(),
        Destination::ThankYou => routes::THANK_YOU.into(),
    }
}
