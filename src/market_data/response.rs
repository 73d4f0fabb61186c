use serde_json::Value;

/// What a vendor response body turned out to be.
///
/// Vendors answer rate limits and bad symbols with HTTP 200 and an error
/// payload, so each adapter runs its bodies through a classifier that returns
/// one of these before trusting any numbers in it.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorResponse<T> {
    Success(T),
    /// The vendor answered with an error or rate-limit message.
    VendorError(String),
    /// The body was not the shape we expected, or a price was not a usable number.
    ParseError(String),
}

impl<T> VendorResponse<T> {
    /// Collapse into a `Result`, describing the failure for logs.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            VendorResponse::Success(value) => Ok(value),
            VendorResponse::VendorError(msg) => Err(format!("vendor error: {msg}")),
            VendorResponse::ParseError(msg) => Err(format!("unexpected response: {msg}")),
        }
    }
}

/// Parse a body as JSON, describing garbage for a [`VendorResponse::ParseError`].
pub(crate) fn parse_body(body: &str) -> Result<Value, String> {
    serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))
}

/// Read a price that vendors send either as a JSON number or a numeric string.
///
/// Negative, NaN and infinite values are rejected.
pub(crate) fn price_from_value(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}
