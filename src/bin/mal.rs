//! The mal REPL: read a line, evaluate it, print the result, repeat.
//!
//! Reader failures print as `error: <message>` and the loop continues.
//! Evaluation failures arrive as ordinary error values and print through
//! the normal result path, so they look the same to the user. End of
//! input ends the process with success.

use malrs::evaluator;
use malrs::printer::pr_str;
use malrs::reader;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

fn main() {
    pretty_env_logger::init();

    let mut rl = DefaultEditor::new().expect("could not initialize line editor");
    let env = evaluator::create_global_env();

    loop {
        match rl.readline("user> ") {
            Ok(line) => {
                let trimmed = line.trim();
                // Nothing to read on blank or comment-only lines
                if trimmed.is_empty() || trimmed.starts_with(';') {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match reader::read_str(&line) {
                    Ok(form) => {
                        let result = evaluator::eval(&form, &env);
                        println!("{}", pr_str(&result, true));
                    }
                    Err(err) => println!("error: {err}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("error: {err:?}");
                break;
            }
        }
    }
}
