//! Utility functions and helpers

use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Convert lamports to SOL (as f64)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Format lamport amount for display
pub fn format_lamports(lamports: u64) -> String {
    if lamports >= LAMPORTS_PER_SOL / 1_000 {
        format!("{:.6} SOL", lamports_to_sol(lamports))
    } else {
        format!("{} lamports", lamports)
    }
}
