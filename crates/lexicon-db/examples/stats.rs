use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lexicon_db::Lexicon;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lexicon-db --example stats -- <lexicon-file>")?;

    let lexicon = Lexicon::load(&path)
        .with_context(|| format!("loading lexicon from {}", path.display()))?;

    let mut phones: BTreeMap<&str, usize> = BTreeMap::new();
    let mut max_variants = 0usize;
    let mut total_phones = 0usize;
    for (_, transcriptions) in lexicon.iter() {
        max_variants = max_variants.max(transcriptions.len());
        for t in transcriptions {
            total_phones += t.len();
            for phone in t.phones() {
                *phones.entry(phone.as_str()).or_default() += 1;
            }
        }
    }

    println!("Lexicon: {}", path.display());
    println!("Words         : {}", lexicon.len());
    println!("Transcriptions: {}", lexicon.transcription_count());
    println!("Max variants  : {}", max_variants);
    println!(
        "Mean length   : {:.2}",
        total_phones as f64 / lexicon.transcription_count().max(1) as f64
    );
    println!("Phone set ({}):", phones.len());
    for (phone, count) in phones {
        println!("  {phone:<6}{count}");
    }

    Ok(())
}
