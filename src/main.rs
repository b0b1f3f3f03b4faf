// Entry point for the Minesweeper TUI application
// Loads configuration and launches the main UI loop

use std::error::Error;

// Module declarations
mod msw_board;   // Board contents and generation
mod msw_color;   // Terminal color capability adaptation
mod msw_conf;    // Configuration persistence
mod msw_session; // Reveal/flag state machine
mod msw_ui;      // Terminal UI rendering and event handling

use msw_conf::load_or_create_config;
use msw_ui::run as run_ui;

fn main() -> Result<(), Box<dyn Error>> {
    // Load or create user configuration (difficulty, grid size)
    let mut cfg = load_or_create_config();

    // Launch the main UI loop
    run_ui(&mut cfg)
}
