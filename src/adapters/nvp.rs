//! Name-value-pair wire format: URL-encoded `KEY=value` pairs joined
//! with `&`, used both for gateway calls and the shipping callback reply.

use std::collections::HashMap;
use url::form_urlencoded;

pub fn encode<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

pub fn decode(raw: &str) -> HashMap<String, String> {
    form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}
