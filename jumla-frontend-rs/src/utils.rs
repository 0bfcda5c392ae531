pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Seed for the practice-queue shuffle, drawn from the platform's entropy source.
pub fn shuffle_rng() -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng as _;

    rand_chacha::ChaCha8Rng::from_entropy()
}
