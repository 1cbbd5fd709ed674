//! Preset edit example - applies a catalogue preset to a photo.
//!
//! Run with: `cargo run --example edit_image -- <photo.jpg> [preset-id]`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use nb_studio::prompt::find_preset;
use nb_studio::{AccessPolicy, EditRequest, GeminiProvider, Session, Studio, StudioError, Upload};

#[tokio::main]
async fn main() -> nb_studio::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("Usage: edit_image <photo.jpg> [preset-id]");
        return Ok(());
    };
    let preset_id = args.next().unwrap_or_else(|| "figurine".to_string());
    let preset = find_preset(&preset_id)
        .ok_or_else(|| StudioError::InvalidRequest(format!("unknown preset: {preset_id}")))?;

    let provider = GeminiProvider::builder().build()?;
    let studio = Studio::new(provider, AccessPolicy::default());
    let session = Session::verified("demo@example.com");

    let request = EditRequest::from_preset(preset, Upload::from_path(&input_path)?);
    let image = studio.edit(Some(&session), request).await?;

    let output = format!("edited.{}", image.format.extension());
    image.save(&output)?;
    println!("{} saved to {} ({} bytes)", preset.label, output, image.size());

    Ok(())
}
