/// Says hello.
///
/// do:api method=GET path=/ping
pub async fn hello() -> &'static str {
    "Hello, World!"
}

/// Returns the request body unchanged.
///
/// do:api method=POST path=/echo
pub async fn echo(body: String) -> String {
    body
}

/// Not a handler: no directive on the last doc line.
pub fn greeting() -> &'static str {
    "Hello"
}
