pub use anyhow::Error;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Prints a warning. By using our own function for this, it'll be easier to find places that
/// issue warnings if we want to say have a flag to suppress them.
pub(crate) fn warning(message: &str) {
    println!("WARNING: quoll: {message}");
}
