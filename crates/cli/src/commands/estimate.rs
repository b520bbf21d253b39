//! `tessera estimate` — Token estimate for a text.

use std::io::Read;

use tessera_context::TokenTally;

pub fn run(text: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let tally = TokenTally::of(&text);
    tracing::debug!(words = tally.words, cjk = tally.cjk_chars, "Counted text");
    println!("{}", tally.tokens());
    Ok(())
}
