use serde::Serialize;

/// Emit a lifecycle event onto the audit trail. Events flow through the
/// tracing pipeline under the `stockflow::audit` target as JSON, which
/// keeps them greppable and shippable without an event bus.
pub fn record<E: Serialize + std::fmt::Debug>(name: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => {
            tracing::info!(target: "stockflow::audit", event = name, payload = %payload)
        }
        Err(_) => {
            tracing::info!(target: "stockflow::audit", event = name, payload = ?event)
        }
    }
}
