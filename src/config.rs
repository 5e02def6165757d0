use {crate::domain::money::Currency, std::env};

/// Which PayPal environment the NVP client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Live,
}

impl Environment {
    pub fn api_endpoint(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api-3t.sandbox.paypal.com/nvp",
            Self::Live => "https://api-3t.paypal.com/nvp",
        }
    }

    /// Base of the buyer-facing checkout UI (`webscr`).
    pub fn checkout_base(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://www.sandbox.paypal.com/webscr",
            Self::Live => "https://www.paypal.com/webscr",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub username: String,
    pub password: String,
    pub signature: String,
    /// NVP protocol version sent with every call.
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ExpressConfig {
    pub gateway: GatewayConfig,
    /// Public base URL of this site, used for the return/cancel URLs the
    /// gateway redirects the buyer back to.
    pub site_base_url: String,
    /// Host override for the shipping-options callback URL so the gateway
    /// can reach a developer machine. Only set in development.
    pub callback_host: Option<String>,
    pub currency: Currency,
}

impl ExpressConfig {
    /// Read configuration from the environment. Only called from `main`,
    /// before the server starts, so missing variables abort startup.
    pub fn from_env() -> Self {
        let environment = match env::var("PAYPAL_SANDBOX_MODE").as_deref() {
            Ok("0") | Ok("false") => Environment::Live,
            _ => Environment::Sandbox,
        };
        let currency = env::var("SHOP_CURRENCY")
            .ok()
            .as_deref()
            .map(|c| Currency::try_from(c).expect("unsupported SHOP_CURRENCY"))
            .unwrap_or(Currency::Gbp);
        Self {
            gateway: GatewayConfig {
                environment,
                username: env::var("PAYPAL_API_USERNAME").expect("PAYPAL_API_USERNAME must be set"),
                password: env::var("PAYPAL_API_PASSWORD").expect("PAYPAL_API_PASSWORD must be set"),
                signature: env::var("PAYPAL_API_SIGNATURE")
                    .expect("PAYPAL_API_SIGNATURE must be set"),
                version: env::var("PAYPAL_API_VERSION").unwrap_or_else(|_| "119".into()),
            },
            site_base_url: env::var("SITE_BASE_URL").expect("SITE_BASE_URL must be set"),
            callback_host: env::var("PAYPAL_CALLBACK_HTTP_HOST").ok(),
            currency,
        }
    }

    /// Base URL the shipping-options callback is built on: the override
    /// host in development, the public site otherwise.
    pub fn callback_base_url(&self) -> String {
        match &self.callback_host {
            Some(host) => format!("http://{host}"),
            None => self.site_base_url.clone(),
        }
    }
}
