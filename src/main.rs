// viewexpr: parse, fold, and evaluate view descriptor expressions

use std::rc::Rc;

use futures::executor::block_on;

use viewexpr::{parse, Evaluator, IntegerModel, NullHost};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut model = IntegerModel::ILP32;
    let mut printf = false;
    let mut text: Option<&str> = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--m64" => model = IntegerModel::LP64,
            "--printf" => printf = true,
            other => text = Some(other),
        }
    }

    let text = match text {
        Some(t) => t,
        None => {
            let name = args.first().map(|s| s.as_str()).unwrap_or("viewexpr");
            eprintln!("Usage: {} [--m64] [--printf] <expression>", name);
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  {} '1 << 4 | 3'", name);
            eprintln!("  {} --m64 'sizeof(long)'", name);
            eprintln!("  {} --printf 'v=%x[1+2]'", name);
            std::process::exit(1);
        }
    };

    let parsed = parse(text, model, printf);

    for diag in &parsed.diagnostics {
        eprintln!("{}", diag);
    }

    println!("tree: {}", parsed.root);
    if !parsed.symbols.is_empty() {
        let mut names: Vec<&str> = parsed.symbols.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        println!("symbols: {}", names.join(" "));
    }

    if parsed.is_printf {
        // Constant segments render against the empty host; anything that
        // needs a target reports a diagnostic instead.
        let mut evaluator = Evaluator::new(Rc::new(NullHost), model);
        let outcome = block_on(evaluator.evaluate(&parsed));
        for diag in &outcome.diagnostics {
            eprintln!("{}", diag);
        }
        if let Some(rendered) = outcome.text {
            println!("text: {}", rendered);
        }
    } else if let Some(cv) = parsed.const_value {
        println!("constant: {} ({})", cv, cv.ty());
    }

    if parsed.has_errors() {
        std::process::exit(1);
    }
}
