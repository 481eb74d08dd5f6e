pub mod turnstile;

pub use turnstile::{BotVerifier, TurnstileVerifier};
