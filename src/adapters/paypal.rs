use {
    super::nvp,
    crate::config::GatewayConfig,
    crate::domain::{
        error::GatewayError,
        gateway::{GatewayClient, GatewayExchange, InitiateParams},
        id::{PayerId, Token},
        money::{Amount, Currency, Money},
        transaction::{Ack, ApiMethod},
    },
    async_trait::async_trait,
    std::collections::HashMap,
    std::time::Duration,
};

/// PayPal Express Checkout over the classic NVP API. One HTTPS POST per
/// call; credentials ride along as form fields and are redacted by the
/// ledger before anything is persisted.
pub struct PayPalNvp {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl PayPalNvp {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn call(
        &self,
        method: ApiMethod,
        params: Vec<(String, String)>,
    ) -> Result<GatewayExchange, GatewayError> {
        let mut pairs: Vec<(String, String)> = vec![
            ("METHOD".into(), method.as_str().into()),
            ("VERSION".into(), self.config.version.clone()),
            ("USER".into(), self.config.username.clone()),
            ("PWD".into(), self.config.password.clone()),
            ("SIGNATURE".into(), self.config.signature.clone()),
        ];
        pairs.extend(params);
        let raw_request = nvp::encode(&pairs);

        let response = self
            .http
            .post(self.config.environment.api_endpoint())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(raw_request.clone())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let raw_response = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let fields = nvp::decode(&raw_response);
        let ack = fields
            .get("ACK")
            .map(|raw| Ack::parse(raw))
            .ok_or_else(|| GatewayError::Protocol("response missing ACK".into()))?;

        let exchange = GatewayExchange {
            method,
            version: fields
                .get("VERSION")
                .cloned()
                .unwrap_or_else(|| self.config.version.clone()),
            ack,
            token: fields.get("TOKEN").cloned(),
            correlation_id: fields.get("CORRELATIONID").cloned(),
            error_code: fields.get("L_ERRORCODE0").cloned(),
            error_message: fields
                .get("L_LONGMESSAGE0")
                .or_else(|| fields.get("L_SHORTMESSAGE0"))
                .cloned(),
            amount: parse_amount(&fields),
            raw_request,
            raw_response,
            fields,
        };

        tracing::info!(
            method = %method,
            ack = exchange.ack.as_str(),
            token = exchange.token.as_deref().unwrap_or("-"),
            correlation_id = exchange.correlation_id.as_deref().unwrap_or("-"),
            error_code = exchange.error_code.as_deref().unwrap_or("-"),
            "gateway call completed"
        );
        Ok(exchange)
    }
}

/// Amount/currency under whichever key family the call used. Confirm
/// responses report under PAYMENTINFO, the others under PAYMENTREQUEST.
fn parse_amount(fields: &HashMap<String, String>) -> Option<Money> {
    const AMOUNT_KEYS: [&str; 3] = ["PAYMENTINFO_0_AMT", "PAYMENTREQUEST_0_AMT", "AMT"];
    const CURRENCY_KEYS: [&str; 3] = [
        "PAYMENTINFO_0_CURRENCYCODE",
        "PAYMENTREQUEST_0_CURRENCYCODE",
        "CURRENCYCODE",
    ];
    let amount = AMOUNT_KEYS
        .iter()
        .find_map(|key| fields.get(*key))
        .and_then(|raw| Amount::parse(raw).ok())?;
    let currency = CURRENCY_KEYS
        .iter()
        .find_map(|key| fields.get(*key))
        .and_then(|raw| Currency::try_from(raw.as_str()).ok())?;
    Some(Money::new(amount, currency))
}

#[async_trait]
impl GatewayClient for PayPalNvp {
    async fn initiate(&self, params: &InitiateParams) -> Result<GatewayExchange, GatewayError> {
        let currency = params.amount.currency().as_str().to_string();
        let item_total = params.amount.amount();

        let mut pairs: Vec<(String, String)> = vec![
            ("PAYMENTREQUEST_0_PAYMENTACTION".into(), "Sale".into()),
            ("PAYMENTREQUEST_0_CURRENCYCODE".into(), currency),
            ("RETURNURL".into(), params.return_url.clone()),
            ("CANCELURL".into(), params.cancel_url.clone()),
            (
                "NOSHIPPING".into(),
                if params.no_shipping { "1" } else { "0" }.into(),
            ),
        ];

        // Checkout-fixed shipping rides as a separate charge on top of the
        // item total; otherwise the gateway shows the candidate options.
        match params.shipping_charge {
            Some(charge) => {
                let total = item_total
                    .checked_add(charge)
                    .ok_or_else(|| GatewayError::Protocol("order total overflow".into()))?;
                pairs.push(("PAYMENTREQUEST_0_ITEMAMT".into(), item_total.to_wire()));
                pairs.push(("PAYMENTREQUEST_0_SHIPPINGAMT".into(), charge.to_wire()));
                pairs.push(("PAYMENTREQUEST_0_AMT".into(), total.to_wire()));
            }
            None => pairs.push(("PAYMENTREQUEST_0_AMT".into(), item_total.to_wire())),
        }

        if let Some(email) = &params.buyer_email {
            pairs.push(("EMAIL".into(), email.clone()));
        }

        if let Some(address) = &params.address_override {
            pairs.push(("ADDROVERRIDE".into(), "1".into()));
            let fields: [(&str, Option<&str>); 6] = [
                ("PAYMENTREQUEST_0_SHIPTONAME", address.name.as_deref()),
                ("PAYMENTREQUEST_0_SHIPTOSTREET", address.line1.as_deref()),
                ("PAYMENTREQUEST_0_SHIPTOSTREET2", address.line2.as_deref()),
                ("PAYMENTREQUEST_0_SHIPTOCITY", address.city.as_deref()),
                ("PAYMENTREQUEST_0_SHIPTOSTATE", address.state.as_deref()),
                ("PAYMENTREQUEST_0_SHIPTOZIP", address.postcode.as_deref()),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    pairs.push((key.into(), value.into()));
                }
            }
            if !address.country.is_empty() {
                pairs.push((
                    "PAYMENTREQUEST_0_SHIPTOCOUNTRYCODE".into(),
                    address.country.as_str().into(),
                ));
            }
        }

        for (index, item) in params.items.iter().enumerate() {
            pairs.push((
                format!("L_PAYMENTREQUEST_0_NAME{index}"),
                item.title.clone(),
            ));
            pairs.push((
                format!("L_PAYMENTREQUEST_0_AMT{index}"),
                item.unit_price.amount().to_wire(),
            ));
            pairs.push((
                format!("L_PAYMENTREQUEST_0_QTY{index}"),
                item.quantity.to_string(),
            ));
        }

        if let Some(callback_url) = &params.callback_url {
            pairs.push(("CALLBACK".into(), callback_url.clone()));
            pairs.push(("CALLBACKTIMEOUT".into(), "3".into()));
        }
        if !params.shipping_options.is_empty() {
            // MAXAMT lets the gateway authorise up to the dearest option.
            let dearest = params
                .shipping_options
                .iter()
                .map(|method| method.charge.amount())
                .max()
                .unwrap_or_else(Amount::zero);
            if let Some(max) = item_total.checked_add(dearest) {
                pairs.push(("MAXAMT".into(), max.to_wire()));
            }
            for (index, method) in params.shipping_options.iter().enumerate() {
                pairs.push((format!("L_SHIPPINGOPTIONNAME{index}"), method.name.clone()));
                pairs.push((format!("L_SHIPPINGOPTIONLABEL{index}"), method.name.clone()));
                pairs.push((
                    format!("L_SHIPPINGOPTIONAMOUNT{index}"),
                    method.charge.amount().to_wire(),
                ));
                pairs.push((
                    format!("L_SHIPPINGOPTIONISDEFAULT{index}"),
                    if index == 0 { "true" } else { "false" }.into(),
                ));
            }
        }

        self.call(ApiMethod::SetExpressCheckout, pairs).await
    }

    async fn fetch_details(&self, token: &Token) -> Result<GatewayExchange, GatewayError> {
        self.call(
            ApiMethod::GetExpressCheckoutDetails,
            vec![("TOKEN".into(), token.as_str().into())],
        )
        .await
    }

    async fn confirm(
        &self,
        payer_id: &PayerId,
        token: &Token,
        amount: &Money,
    ) -> Result<GatewayExchange, GatewayError> {
        self.call(
            ApiMethod::DoExpressCheckoutPayment,
            vec![
                ("TOKEN".into(), token.as_str().into()),
                ("PAYERID".into(), payer_id.as_str().into()),
                ("PAYMENTREQUEST_0_AMT".into(), amount.amount().to_wire()),
                (
                    "PAYMENTREQUEST_0_CURRENCYCODE".into(),
                    amount.currency().as_str().into(),
                ),
                ("PAYMENTREQUEST_0_PAYMENTACTION".into(), "Sale".into()),
            ],
        )
        .await
    }

    fn checkout_url(&self, token: &Token) -> String {
        let query = nvp::encode(&[("cmd", "_express-checkout"), ("token", token.as_str())]);
        format!("{}?{}", self.config.environment.checkout_base(), query)
    }
}
