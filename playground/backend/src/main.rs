//! Serves the playground frontend. The compiled interpreter (`pkg/rust_lox.js`
//! and its `.wasm`) is served from the `public` folder.

use moon::*;

async fn frontend() -> Frontend {
    Frontend::new().title("Lox Playground")
}

async fn up_msg_handler(_: UpMsgRequest<()>) {}

#[moon::main]
async fn main() -> std::io::Result<()> {
    start(frontend, up_msg_handler, |_| {}).await
}
