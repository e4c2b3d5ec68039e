use colored::Colorize;

pub fn print_menu(index_name: &str, backend: &str) {
    println!("\n📚 {} ({})", index_name.bright_cyan().bold(), backend);
    println!("  1 - Ingest a text file");
    println!("  2 - Ingest a web page");
    println!("  3 - Ask questions");
    println!("  4 - Exit");
    println!();
}

pub fn print_goodbye() {
    println!("👋 Goodbye!");
}
