//! Text-only generation through the studio.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use nb_studio::{AccessPolicy, GeminiProvider, Session, Studio};

#[tokio::main]
async fn main() -> nb_studio::Result<()> {
    let provider = GeminiProvider::builder().build()?;
    let studio = Studio::new(provider, AccessPolicy::default());
    let session = Session::verified("demo@example.com");

    let image = studio
        .prompt_only(Some(&session), "A golden retriever puppy playing in snow")
        .await?;

    image.save("output.png")?;
    println!(
        "Generated image: {} bytes, format: {}",
        image.size(),
        image.format
    );

    Ok(())
}
