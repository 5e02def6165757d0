use {
    crate::config::ExpressConfig,
    crate::domain::{
        address::Address,
        basket::Basket,
        context::SessionContext,
        error::{CheckoutError, GatewayError, StoreError},
        gateway::{GatewayClient, InitiateParams, TransactionDetails},
        id::{PayerId, Token},
        money::{Amount, Money},
        order::{OrderStatus, OrderSubmission, PaymentEvent, PaymentSource},
        outcome::{Destination, Flash, PaymentArgs, PhaseOutcome, PreviewContext, SuccessReturn},
        shipping::{ShippingMethod, ShippingResolver},
        stores::{BasketStore, OrderStore, TransactionLedger},
        transaction::{PreAuthSnapshot, TransactionRecord},
    },
    crate::routes,
    std::sync::Arc,
    uuid::Uuid,
};

/// Decline meaning the buyer must pick another funding source on the
/// gateway's own UI. The order may still be payable, so this is the one
/// capture failure that re-redirects to the gateway instead of cancelling.
const RETRY_DECLINE_CODE: &str = "10486";

const CANCELLED_MSG: &str = "PayPal transaction cancelled";
const GATEWAY_DOWN_MSG: &str =
    "A problem occurred communicating with PayPal - please try again later";

/// Drives the four phases of the off-site checkout flow. Stateless between
/// requests: every phase reads what it needs from its parameters, the
/// stores and the transaction ledger, never from fields set by an earlier
/// phase.
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn GatewayClient>,
    ledger: Arc<dyn TransactionLedger>,
    baskets: Arc<dyn BasketStore>,
    orders: Arc<dyn OrderStore>,
    shipping: Arc<dyn ShippingResolver>,
    config: ExpressConfig,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn GatewayClient>,
        ledger: Arc<dyn TransactionLedger>,
        baskets: Arc<dyn BasketStore>,
        orders: Arc<dyn OrderStore>,
        shipping: Arc<dyn ShippingResolver>,
        config: ExpressConfig,
    ) -> Self {
        Self {
            gateway,
            ledger,
            baskets,
            orders,
            shipping,
            config,
        }
    }

    // ── Phase A: initiate ──────────────────────────────────────────────

    /// Register the transaction with the gateway and send the buyer there.
    ///
    /// `as_payment_method` is true when the buyer comes from checkout with
    /// an address and method already chosen, false when they jump straight
    /// from the basket page and will pick shipping on the gateway.
    ///
    /// Only store failures surface as `Err`; every checkout-level failure
    /// is already mapped to a redirect + message.
    pub async fn initiate(
        &self,
        basket_id: Uuid,
        as_payment_method: bool,
        ctx: &SessionContext,
    ) -> Result<PhaseOutcome, CheckoutError> {
        match self.initiate_inner(basket_id, as_payment_method, ctx).await {
            Ok(outcome) => Ok(outcome),
            Err(CheckoutError::Store(err)) => Err(CheckoutError::Store(err)),
            Err(err) => Ok(Self::initiate_failure(err)),
        }
    }

    async fn initiate_inner(
        &self,
        basket_id: Uuid,
        as_payment_method: bool,
        ctx: &SessionContext,
    ) -> Result<PhaseOutcome, CheckoutError> {
        let basket = self
            .baskets
            .get(basket_id)
            .await?
            .ok_or(CheckoutError::BasketNotFound)?;
        if basket.is_empty() {
            return Err(CheckoutError::EmptyBasket);
        }

        let mut address_override = None;
        let mut shipping_charge = None;
        let mut shipping_options = Vec::new();
        if basket.requires_shipping() {
            if as_payment_method {
                let address = ctx
                    .shipping_address
                    .clone()
                    .ok_or(CheckoutError::MissingShippingAddress)?;
                let method = ctx
                    .shipping_method
                    .clone()
                    .ok_or(CheckoutError::MissingShippingMethod)?;
                shipping_charge = Some(method.charge.amount());
                address_override = Some(address);
            } else {
                shipping_options = self.shipping.methods_for(basket.owner(), &basket, None);
            }
        }

        let callback_url = (!shipping_options.is_empty()).then(|| {
            format!(
                "{}{}",
                self.config.callback_base_url(),
                routes::shipping_options(basket_id)
            )
        });
        let params = InitiateParams {
            amount: basket.total()?,
            items: basket.lines().to_vec(),
            return_url: format!(
                "{}{}",
                self.config.site_base_url,
                routes::success_return(basket_id)
            ),
            cancel_url: format!(
                "{}{}",
                self.config.site_base_url,
                routes::cancel_return(basket_id)
            ),
            callback_url,
            buyer_email: ctx.email.clone(),
            address_override,
            shipping_charge,
            shipping_options,
            no_shipping: !basket.requires_shipping(),
        };

        let exchange = self.gateway.initiate(&params).await?;
        self.ledger
            .record(TransactionRecord::from_exchange(&exchange))
            .await?;
        let token = exchange.require_token()?;

        let snapshot =
            PreAuthSnapshot::capture(token.clone(), &basket, ctx).map_err(StoreError::from)?;
        self.ledger.store_snapshot(snapshot).await?;

        // Freeze before the redirect leaves, so nothing can edit a basket
        // whose funds may already be reserved remotely.
        self.baskets.freeze(basket_id).await?;

        tracing::info!(%basket_id, token = token.as_str(), "transaction registered, basket frozen");
        Ok(PhaseOutcome::to(Destination::Gateway(
            self.gateway.checkout_url(&token),
        )))
    }

    fn initiate_failure(err: CheckoutError) -> PhaseOutcome {
        match err {
            CheckoutError::EmptyBasket => PhaseOutcome::with(
                Destination::BasketSummary,
                Flash::error("Your basket is empty"),
            ),
            CheckoutError::InvalidBasket(msg) => {
                PhaseOutcome::with(Destination::BasketSummary, Flash::warning(msg))
            }
            CheckoutError::MissingShippingAddress => PhaseOutcome::with(
                Destination::ShippingAddressForm,
                Flash::error("A shipping address must be specified"),
            ),
            CheckoutError::MissingShippingMethod => PhaseOutcome::with(
                Destination::ShippingMethodForm,
                Flash::error("A shipping method must be specified"),
            ),
            err => {
                tracing::warn!(error = %err, "unable to initiate gateway transaction");
                PhaseOutcome::with(
                    Destination::BasketSummary,
                    Flash::error("An error occurred communicating with PayPal"),
                )
            }
        }
    }

    // ── Phase B: cancel return ─────────────────────────────────────────

    /// The buyer backed out on the gateway, or the gateway bounced them
    /// here after a decline. Idempotent: a second cancel for the same
    /// basket finds it already thawed and does nothing.
    pub async fn handle_cancel(
        &self,
        basket_id: Uuid,
        token: Option<&str>,
    ) -> Result<PhaseOutcome, CheckoutError> {
        // An order existing for this basket means the decline-retry path
        // already placed one; cancel the order, not the basket.
        if let Some(order) = self.orders.find_by_basket(basket_id).await? {
            self.orders
                .set_status(order.number(), OrderStatus::Cancelled)
                .await?;
            tracing::info!(order_number = %order.number(), "cancel return for an already-placed order");
            return Ok(PhaseOutcome::with(
                Destination::OrderStatus(order.number().clone()),
                Flash::error(CANCELLED_MSG),
            ));
        }

        self.baskets.thaw(basket_id).await?;
        tracing::info!(
            %basket_id,
            token = token.unwrap_or("<no token>"),
            "payment cancelled, basket thawed"
        );
        Ok(PhaseOutcome::with(
            Destination::BasketSummary,
            Flash::error(CANCELLED_MSG),
        ))
    }

    // ── Phase C: success return / preview ──────────────────────────────

    /// The buyer came back approved. Either render the order preview or,
    /// when an order already exists for this basket, skip straight to
    /// capture — hitting this page twice must never double-submit.
    pub async fn handle_success_return(
        &self,
        basket_id: Uuid,
        token: Option<&str>,
        payer_id: Option<&str>,
    ) -> Result<SuccessReturn, CheckoutError> {
        let order = self.orders.find_by_basket(basket_id).await?;

        let Some((token, payer_id)) = parse_gateway_params(token, payer_id) else {
            tracing::warn!(%basket_id, "missing query parameters on success return");
            return Ok(SuccessReturn::Redirect(PhaseOutcome::with(
                Destination::BasketSummary,
                Flash::error("Unable to determine PayPal transaction details"),
            )));
        };

        let details = match self.fetch_details_recorded(&token).await {
            Ok(details) => details,
            Err(CheckoutError::Store(err)) => return Err(CheckoutError::Store(err)),
            Err(err) => {
                tracing::warn!(token = token.as_str(), error = %err, "unable to fetch transaction details");
                let destination = match &order {
                    Some(order) => Destination::OrderStatus(order.number().clone()),
                    None => Destination::BasketSummary,
                };
                return Ok(SuccessReturn::Redirect(PhaseOutcome::with(
                    destination,
                    Flash::error(GATEWAY_DOWN_MSG),
                )));
            }
        };

        if let Some(order) = order {
            return Ok(SuccessReturn::Redirect(PhaseOutcome::to(
                Destination::Payment(PaymentArgs {
                    order_number: order.number().clone(),
                    amount: details.amount,
                    token,
                    payer_id,
                }),
            )));
        }

        let Some(basket) = self.baskets.load_frozen(basket_id).await? else {
            tracing::warn!(%basket_id, "no frozen basket for returning buyer");
            return Ok(SuccessReturn::Redirect(PhaseOutcome::with(
                Destination::BasketSummary,
                Flash::error("No basket was found that corresponds to your PayPal transaction"),
            )));
        };

        let email = match details.email {
            Some(email) => Some(email),
            None => self
                .ledger
                .find_snapshot(&token)
                .await?
                .and_then(|snapshot| snapshot.email().map(str::to_string)),
        };

        tracing::info!(
            %basket_id,
            payer_id = payer_id.as_str(),
            token = token.as_str(),
            "showing preview"
        );
        Ok(SuccessReturn::Preview(PreviewContext {
            basket_id,
            token,
            payer_id,
            email,
            amount: details.amount,
            basket,
        }))
    }

    /// The buyer confirmed the preview. Details are fetched again — the
    /// amount a browser posted is never trusted — and the order is placed
    /// before any money moves.
    pub async fn submit_preview(
        &self,
        basket_id: Uuid,
        token: Option<&str>,
        payer_id: Option<&str>,
        terms_accepted: bool,
        ctx: &SessionContext,
    ) -> Result<PhaseOutcome, CheckoutError> {
        let Some((token, payer_id)) = parse_gateway_params(token, payer_id) else {
            tracing::warn!(%basket_id, error = %CheckoutError::MissingParameters, "rejecting preview submission");
            return Ok(PhaseOutcome::with(
                Destination::BasketSummary,
                Flash::error(GATEWAY_DOWN_MSG),
            ));
        };

        match self
            .submit_inner(basket_id, &token, &payer_id, terms_accepted, ctx)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(CheckoutError::Store(err)) => Err(CheckoutError::Store(err)),
            Err(err) => Ok(Self::submit_failure(err, basket_id, token, payer_id)),
        }
    }

    async fn submit_inner(
        &self,
        basket_id: Uuid,
        token: &Token,
        payer_id: &PayerId,
        terms_accepted: bool,
        ctx: &SessionContext,
    ) -> Result<PhaseOutcome, CheckoutError> {
        let details = self.fetch_details_recorded(token).await?;
        let basket = self
            .baskets
            .load_frozen(basket_id)
            .await?
            .ok_or(CheckoutError::BasketNotFound)?;

        // Session context first, pre-auth snapshot as the fallback when the
        // host session did not survive the round trip to the gateway.
        let snapshot = self.ledger.find_snapshot(token).await?;
        let shipping_address = ctx
            .shipping_address
            .clone()
            .or_else(|| snapshot.as_ref().and_then(PreAuthSnapshot::shipping_address));
        let billing_address = ctx
            .billing_address
            .clone()
            .or_else(|| snapshot.as_ref().and_then(PreAuthSnapshot::billing_address))
            .or_else(|| shipping_address.clone());

        if basket.requires_shipping() {
            let shipping = shipping_address
                .as_ref()
                .ok_or(CheckoutError::MissingShippingAddress)?;
            if let Some(billing) = &billing_address {
                if shipping.country != billing.country {
                    return Err(CheckoutError::CountryMismatch);
                }
            }
        }
        if !terms_accepted {
            return Err(CheckoutError::TermsNotAccepted);
        }

        let shipping_method =
            self.resolve_shipping_method(&details, ctx, &basket, shipping_address.as_ref());
        let guest_email = details.email.clone().or_else(|| {
            snapshot
                .as_ref()
                .and_then(|snapshot| snapshot.email().map(str::to_string))
        });

        let order = self
            .orders
            .place(OrderSubmission {
                basket_id,
                guest_email,
                payer_id: payer_id.clone(),
                token: token.clone(),
                total: details.amount,
                shipping_method,
                shipping_address,
                billing_address,
            })
            .await?;

        tracing::info!(order_number = %order.number(), %basket_id, "order placed, handing over to capture");
        Ok(PhaseOutcome::to(Destination::Payment(PaymentArgs {
            order_number: order.number().clone(),
            amount: details.amount,
            token: token.clone(),
            payer_id: payer_id.clone(),
        })))
    }

    fn submit_failure(
        err: CheckoutError,
        basket_id: Uuid,
        token: Token,
        payer_id: PayerId,
    ) -> PhaseOutcome {
        let back_to_preview = Destination::Preview {
            basket_id,
            token,
            payer_id,
        };
        match err {
            CheckoutError::CountryMismatch => PhaseOutcome::with(
                back_to_preview,
                Flash::error("Different shipping and billing country"),
            ),
            CheckoutError::TermsNotAccepted => PhaseOutcome::with(
                back_to_preview,
                Flash::error("To place your order, you need to agree to our terms and conditions"),
            ),
            CheckoutError::MissingShippingAddress => PhaseOutcome::with(
                Destination::ShippingAddressForm,
                Flash::error("A shipping address must be specified"),
            ),
            err => {
                tracing::warn!(error = %err, "preview submission failed");
                PhaseOutcome::with(Destination::BasketSummary, Flash::error(GATEWAY_DOWN_MSG))
            }
        }
    }

    /// Method used to price the order: the option the buyer picked on the
    /// gateway if any, else the one chosen earlier in the session, else
    /// the cheapest candidate for the destination.
    fn resolve_shipping_method(
        &self,
        details: &TransactionDetails,
        ctx: &SessionContext,
        basket: &Basket,
        destination: Option<&Address>,
    ) -> Option<ShippingMethod> {
        if !basket.requires_shipping() {
            return None;
        }
        if let Some(name) = &details.shipping_option_name {
            let charge = Money::new(
                details.shipping_charge.unwrap_or_else(Amount::zero),
                basket.currency(),
            );
            return Some(ShippingMethod::fixed_price(name.clone(), charge));
        }
        if let Some(method) = &ctx.shipping_method {
            return Some(method.clone());
        }
        self.shipping
            .methods_for(basket.owner(), basket, destination)
            .into_iter()
            .min_by_key(|method| method.charge.amount())
    }

    // ── Phase D: capture ───────────────────────────────────────────────

    /// Capture the funds for a placed order. Three exits: re-redirect to
    /// the gateway on the ambiguous decline, cancel the order on any other
    /// failure, thank-you on success. The payment-details snapshot is
    /// persisted whichever way it goes.
    pub async fn handle_payment(&self, args: &PaymentArgs) -> Result<PhaseOutcome, CheckoutError> {
        let order = self
            .orders
            .find_by_number(&args.order_number)
            .await?
            .ok_or_else(|| {
                StoreError::Other(format!("order {} not found", args.order_number))
            })?;

        self.orders
            .add_payment_source(PaymentSource {
                order: order.number().clone(),
                allocated: args.amount,
                debited: args.amount,
            })
            .await?;

        let outcome = match self.confirm_recorded(args).await {
            Ok(confirmed) => {
                self.orders
                    .add_payment_event(PaymentEvent::settled(
                        order.number().clone(),
                        confirmed.amount,
                        confirmed.correlation_id.clone(),
                    ))
                    .await?;
                self.orders
                    .set_status(order.number(), OrderStatus::Settled)
                    .await?;
                tracing::info!(
                    order_number = %order.number(),
                    correlation_id = confirmed.correlation_id.as_deref().unwrap_or("-"),
                    "payment captured"
                );
                PhaseOutcome::to(Destination::ThankYou)
            }
            Err(CheckoutError::Store(err)) => return Err(CheckoutError::Store(err)),
            Err(CheckoutError::Gateway(GatewayError::Declined {
                code,
                correlation_id,
                message,
            })) if code == RETRY_DECLINE_CODE => {
                tracing::warn!(
                    order_number = %args.order_number,
                    correlation_id = correlation_id.as_deref().unwrap_or("-"),
                    %message,
                    "ambiguous decline, sending buyer back to the gateway"
                );
                PhaseOutcome::to(Destination::Gateway(self.gateway.checkout_url(&args.token)))
            }
            Err(CheckoutError::Gateway(GatewayError::Declined {
                code,
                correlation_id,
                ..
            })) => {
                let code = (!code.is_empty()).then_some(code);
                self.fail_payment(args, code.as_deref(), correlation_id)
                    .await?
            }
            Err(err) => {
                tracing::error!(order_number = %args.order_number, error = %err, "capture failed without a decline code");
                self.fail_payment(args, None, None).await?
            }
        };

        // History survives every branch, declines included.
        self.orders.save_payment_details(&args.order_number).await?;
        Ok(outcome)
    }

    async fn fail_payment(
        &self,
        args: &PaymentArgs,
        code: Option<&str>,
        correlation_id: Option<String>,
    ) -> Result<PhaseOutcome, CheckoutError> {
        self.orders
            .set_status(&args.order_number, OrderStatus::Cancelled)
            .await?;
        self.orders
            .add_payment_event(PaymentEvent::failure(
                args.order_number.clone(),
                args.amount,
                correlation_id,
            ))
            .await?;

        let mut message = String::from(
            "A problem occurred while processing payment for this order - no payment has \
             been taken. Please contact customer services if this problem persists",
        );
        if let Some(code) = code {
            message.push_str(&format!(" [Code: {code}]"));
        }
        Ok(PhaseOutcome::with(
            Destination::OrderStatus(args.order_number.clone()),
            Flash::error(message),
        ))
    }

    // ── Shared helpers ─────────────────────────────────────────────────

    /// One `GetExpressCheckoutDetails` round trip, recorded to the ledger
    /// before any branching on its content.
    async fn fetch_details_recorded(
        &self,
        token: &Token,
    ) -> Result<TransactionDetails, CheckoutError> {
        let exchange = self.gateway.fetch_details(token).await?;
        self.ledger
            .record(TransactionRecord::from_exchange(&exchange))
            .await?;
        Ok(TransactionDetails::try_from(&exchange)?)
    }

    async fn confirm_recorded(
        &self,
        args: &PaymentArgs,
    ) -> Result<TransactionDetails, CheckoutError> {
        let exchange = self
            .gateway
            .confirm(&args.payer_id, &args.token, &args.amount)
            .await?;
        self.ledger
            .record(TransactionRecord::from_exchange(&exchange))
            .await?;
        Ok(TransactionDetails::try_from(&exchange)?)
    }
}

fn parse_gateway_params(token: Option<&str>, payer_id: Option<&str>) -> Option<(Token, PayerId)> {
    let token = Token::new(token?).ok()?;
    let payer_id = PayerId::new(payer_id?).ok()?;
    Some((token, payer_id))
}
