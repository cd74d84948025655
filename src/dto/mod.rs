/// Channel events and server notifications.
pub mod events;
/// Shoot service request and response bodies.
pub mod requests;
/// Shoot and participant snapshots.
pub mod shoot;
/// Shoot code and name checks.
pub mod validation;
