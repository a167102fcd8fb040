//! voxcalc CLI - voxel-wise image calculator.
//!
//! Tokens are consumed left to right: dash-prefixed words naming a
//! catalogue operator apply that operator to the stack, the configuration
//! options below are handled here, and everything else (including `-nan`,
//! `-inf` and negative numeric literals) is pushed as an operand.

use voxcalc::eval::progress::ProgressUpdate;
use voxcalc::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }
    if let Err(e) = run(&args) {
        eprintln!("voxcalc: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> CalcResult<()> {
    let registry = registry();
    let mut builder = ExpressionBuilder::new();
    let mut options = EvalOptions::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if let Some(spec) = arg.strip_prefix('-').and_then(|name| registry.get(name)) {
            builder.apply(spec)?;
            i += 1;
            continue;
        }
        match arg.as_str() {
            "-datatype" => {
                let value = option_value(args, i, "-datatype")?;
                let datatype = DataType::from_spec(value).ok_or_else(|| CalcError::Range {
                    detail: format!("unknown datatype \"{value}\""),
                })?;
                options = options.with_datatype(datatype);
                i += 2;
            }
            "-nthreads" => {
                let value = option_value(args, i, "-nthreads")?;
                let nthreads: usize = value.parse().map_err(|_| CalcError::Range {
                    detail: format!("invalid thread count \"{value}\""),
                })?;
                options = options.with_nthreads(nthreads);
                i += 2;
            }
            "-force" => {
                options = options.with_force(true);
                i += 1;
            }
            "-help" | "--help" => {
                print_help();
                return Ok(());
            }
            "-version" | "--version" => {
                println!("voxcalc {}", voxcalc::VERSION);
                return Ok(());
            }
            _ => {
                builder.push_operand(arg);
                i += 1;
            }
        }
    }

    match builder.finish()? {
        Program::Value(value) => {
            println!("{}", format_scalar(value));
            Ok(())
        }
        Program::Image { root, plan, output } => {
            let geometry = infer(&root)?;
            let force = options.force;
            let options = options.with_progress(|update| match update {
                ProgressUpdate::Started { label, .. } => {
                    eprintln!("voxcalc: computing {}", label);
                }
                ProgressUpdate::Completed {
                    total_duration_ms, ..
                } => {
                    eprintln!("voxcalc: done in {}ms", total_duration_ms);
                }
                _ => {}
            });
            let (header, data) = evaluate_image(&root, &plan, &geometry, &options)?;
            save(&output, &header, &data, force)
        }
    }
}

fn option_value<'a>(args: &'a [String], i: usize, name: &str) -> CalcResult<&'a str> {
    args.get(i + 1).map(|s| s.as_str()).ok_or_else(|| CalcError::Range {
        detail: format!("option {name} expects a value"),
    })
}

fn print_usage() {
    eprintln!("usage: voxcalc <operand> [<operand> ...] [-<operator> ...] [output]");
    eprintln!("       voxcalc -help");
}

fn print_help() {
    println!("voxcalc {} - voxel-wise image calculator", voxcalc::VERSION);
    println!();
    println!("Applies mathematical operations to images using a stack-based");
    println!("syntax: operands (images, values, or the keywords 'rand'/'randn')");
    println!("are pushed in the order they appear, operators consume the");
    println!("top-most stack entries and push their result. The last operand");
    println!("names the output image. Without image operands the result is a");
    println!("number printed to standard output.");
    println!();
    println!("Examples:");
    println!("  voxcalc a.mif 2 -multiply r.mif          r = 2 * a");
    println!("  voxcalc a.mif b.mif -add c.mif -divide r.mif");
    println!("                                           r = (a + b) / c");
    println!("  voxcalc 3 2 -multiply                    prints 6");
    println!();
    for (title, ops) in registry().grouped_by_arity() {
        println!("{title}:");
        for op in ops {
            println!("  -{:<10} {}", op.name, op.description);
        }
        println!();
    }
    println!("Options:");
    println!("  -datatype <spec>  output datatype (float32, float64, cfloat32,");
    println!("                    cfloat64, int8, uint8, int16, uint16, int32, uint32)");
    println!("  -nthreads <n>     worker threads (0 means single-threaded)");
    println!("  -force            overwrite the output image if it exists");
    println!("  -help             show this help");
    println!("  -version          show version");
}
