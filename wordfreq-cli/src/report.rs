use colored::Colorize;
use std::time::Duration;
use wordfreq::CountOutput;

/// Elapsed time rounded to milliseconds, in humantime notation
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    humantime::format_duration(Duration::from_millis(millis)).to_string()
}

/// Prints the ranked words and the run statistics
pub fn print_report(output: &CountOutput, verbose: bool) {
    if output.top.is_empty() {
        println!("No words found");
    } else {
        println!("{}", format!("Top {} words:", output.top.len()).bold());
        let width = output
            .top
            .iter()
            .map(|e| e.word.to_string().chars().count())
            .max()
            .unwrap_or(0);
        for (rank, entry) in output.top.iter().enumerate() {
            let word = entry.word.to_string();
            let pad = width.saturating_sub(word.chars().count());
            println!(
                "{:>4}. {}{} {:>10}",
                rank + 1,
                word.blue(),
                " ".repeat(pad),
                entry.count.to_string().green()
            );
        }
    }

    if verbose {
        println!();
        for worker in &output.workers {
            println!(
                "Worker {}: bytes {}..{}, {} words, {} unique",
                worker.index,
                worker.start,
                worker.start + worker.len,
                worker.total_words,
                worker.unique_words
            );
        }
    }

    println!();
    println!("Total words:  {}", output.total_words);
    println!("Unique words: {}", output.unique_words);
    println!(
        "Elapsed:      {} ({} backend)",
        format_elapsed(output.elapsed),
        output.backend
    );
}

/// Prints the output as pretty JSON
pub fn print_json(output: &CountOutput) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
