use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use jigsaw_core::boundary::fmt_coord;
use jigsaw_core::{
    build_cut_preview, default_difficulty, fit_board, generate_cuts, preset_by_name, wrap_seed,
    AssemblyEngine, BoardGeometry, Difficulty, EngineRules, InitMode, SavedGame,
    DIFFICULTY_PRESETS,
};
use rand::Rng;
use tracing_subscriber::EnvFilter;

mod bot;

#[derive(Parser)]
#[command(name = "jigsaw-cli", version, about = "Generate, inspect and play jigsaw puzzles")]
struct Cli {
    /// TOML file with engine rules (snap tolerance, scatter margin).
    #[arg(long, global = true, env = "JIGSAW_RULES")]
    rules: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the difficulty presets.
    Presets,
    /// Print the cut field of a puzzle as JSON.
    Cuts {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
    /// Start a new scattered puzzle and write its save file.
    New {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[command(flatten)]
        canvas: CanvasArgs,
        #[arg(long, default_value = "puzzle.png")]
        image: String,
        #[arg(long)]
        scatter_seed: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Summarize a save file.
    Check { file: PathBuf },
    /// Render a save file (or a solved puzzle) as SVG outlines.
    Render {
        #[arg(long, conflicts_with = "seed")]
        save: Option<PathBuf>,
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[command(flatten)]
        canvas: CanvasArgs,
        /// Draw the cut overlay of the solved board.
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Let the bot assemble a save file through the pointer handlers.
    Solve {
        file: PathBuf,
        #[command(flatten)]
        canvas: CanvasArgs,
        #[arg(long)]
        bot_seed: Option<u64>,
        #[arg(long, default_value_t = 0.6)]
        miss_ratio: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct PuzzleArgs {
    /// Preset name (Easy, Medium, Hard, Expert).
    #[arg(long, env = "JIGSAW_PRESET")]
    preset: Option<String>,
    #[arg(long, requires = "cols")]
    rows: Option<u32>,
    #[arg(long, requires = "rows")]
    cols: Option<u32>,
    /// Decimal or 0x-prefixed hex; wide values wrap to 32 bits.
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Args)]
struct CanvasArgs {
    #[arg(long, default_value_t = 1280.0)]
    width: f64,
    #[arg(long, default_value_t = 800.0)]
    height: f64,
}

impl CanvasArgs {
    fn area(&self) -> BoardGeometry {
        BoardGeometry::new(0.0, 0.0, self.width, self.height)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = load_rules(cli.rules.as_deref())?;

    match cli.command {
        Commands::Presets => {
            for preset in DIFFICULTY_PRESETS.iter() {
                println!("{}", preset.difficulty().label());
            }
        }
        Commands::Cuts { puzzle } => {
            let difficulty = resolve_difficulty(&puzzle)?;
            let seed = resolve_seed(puzzle.seed.as_deref())?;
            let cuts = generate_cuts(&difficulty, seed)?;
            println!("{}", serde_json::to_string_pretty(&cuts)?);
        }
        Commands::New {
            puzzle,
            canvas,
            image,
            scatter_seed,
            out,
        } => {
            let difficulty = resolve_difficulty(&puzzle)?;
            let seed = resolve_seed(puzzle.seed.as_deref())?;
            let scatter_seed = resolve_seed(scatter_seed.as_deref())?;
            let board = fit_board(canvas.width, canvas.height, &difficulty);
            let engine = AssemblyEngine::new(
                difficulty,
                seed,
                board,
                rules,
                InitMode::Playing {
                    area: canvas.area(),
                    scatter_seed,
                },
            )?;
            tracing::info!(seed, label = %engine.difficulty().label(), "new puzzle");
            let saved = engine.to_saved_game(image);
            write_output(out.as_deref(), &saved.to_json_pretty()?)?;
        }
        Commands::Check { file } => {
            let saved = read_save(&file)?;
            let board = BoardGeometry::new(0.0, 0.0, 1.0, 1.0);
            let engine = AssemblyEngine::restore(&saved, board, rules)?;
            println!("image: {}", saved.image_ref);
            println!("difficulty: {}", saved.difficulty.label());
            println!("seed: {}", saved.seed);
            println!("groups: {}", engine.group_count());
            println!(
                "locked: {}/{} ({:.1}%)",
                engine.locked_count(),
                engine.pieces().len(),
                engine.progress() * 100.0
            );
            println!("complete: {}", engine.is_complete());
        }
        Commands::Render {
            save,
            puzzle,
            canvas,
            preview,
            out,
        } => {
            let engine = match save {
                Some(path) => {
                    let saved = read_save(&path)?;
                    let board = fit_board(canvas.width, canvas.height, &saved.difficulty);
                    AssemblyEngine::restore(&saved, board, rules)?
                }
                None => {
                    let difficulty = resolve_difficulty(&puzzle)?;
                    let seed = resolve_seed(puzzle.seed.as_deref())?;
                    let board = fit_board(canvas.width, canvas.height, &difficulty);
                    AssemblyEngine::new(difficulty, seed, board, rules, InitMode::Complete)?
                }
            };
            let svg = render_svg(&engine, &canvas, preview)?;
            write_output(out.as_deref(), &svg)?;
        }
        Commands::Solve {
            file,
            canvas,
            bot_seed,
            miss_ratio,
            out,
        } => {
            let saved = read_save(&file)?;
            let board = fit_board(canvas.width, canvas.height, &saved.difficulty);
            let mut engine = AssemblyEngine::restore(&saved, board, rules)?;
            let bot_seed = bot_seed.unwrap_or_else(|| rand::rng().random());
            let config = bot::BotConfig {
                miss_ratio,
                ..bot::BotConfig::default()
            };
            let report = bot::solve(&mut engine, bot_seed, config);
            println!(
                "moves: {} merges: {} locks: {} completed: {}",
                report.moves, report.merges, report.locks, report.completed
            );
            if let Some(path) = out {
                let saved = engine.to_saved_game(saved.image_ref);
                write_output(Some(&path), &saved.to_json_pretty()?)?;
            }
        }
    }

    Ok(())
}

fn load_rules(path: Option<&Path>) -> Result<EngineRules, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EngineRules::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let rules = EngineRules::from_toml_str(&contents)?;
    tracing::debug!(path = %path.display(), ?rules, "loaded engine rules");
    Ok(rules)
}

fn read_save(path: &Path) -> Result<SavedGame, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(SavedGame::from_json(&contents)?)
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn resolve_difficulty(args: &PuzzleArgs) -> Result<Difficulty, Box<dyn std::error::Error>> {
    if let (Some(rows), Some(cols)) = (args.rows, args.cols) {
        let difficulty = Difficulty::new(rows, cols);
        difficulty.validate()?;
        return Ok(difficulty);
    }
    match args.preset.as_deref() {
        Some(name) => match preset_by_name(name) {
            Some(preset) => Ok(preset.difficulty()),
            None => {
                let names: Vec<_> = DIFFICULTY_PRESETS.iter().map(|preset| preset.name).collect();
                Err(format!("unknown preset {name:?}, expected one of {}", names.join(", ")).into())
            }
        },
        None => Ok(default_difficulty()),
    }
}

fn resolve_seed(raw: Option<&str>) -> Result<u32, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => parse_seed_arg(raw),
        None => Ok(rand::rng().random()),
    }
}

fn parse_seed_arg(raw: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(wrap_seed(value))
}

fn render_svg(
    engine: &AssemblyEngine,
    canvas: &CanvasArgs,
    preview: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let board = engine.board();
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">"#,
        fmt_coord(canvas.width),
        fmt_coord(canvas.height)
    )?;
    writeln!(
        svg,
        concat!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" "#,
            r##"fill="none" stroke="#888" stroke-dasharray="4 4"/>"##
        ),
        fmt_coord(board.x),
        fmt_coord(board.y),
        fmt_coord(board.width),
        fmt_coord(board.height)
    )?;
    if preview {
        let cuts = generate_cuts(engine.difficulty(), engine.seed())?;
        for line in build_cut_preview(&cuts, engine.difficulty(), &board) {
            writeln!(
                svg,
                r##"<path d="{}" fill="none" stroke="#bbb"/>"##,
                line.to_svg_path()
            )?;
        }
    }
    for id in engine.paint_order() {
        let Some(outline) = engine.outline(id) else {
            continue;
        };
        let locked = engine.piece(id).is_some_and(|piece| piece.is_locked);
        let fill = if locked { "#d8e8d0" } else { "#f4efe4" };
        writeln!(
            svg,
            r##"<path data-piece="{id}" d="{}" fill="{fill}" stroke="#333"/>"##,
            outline.to_svg_path()
        )?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_accept_hex_and_wrap() {
        assert_eq!(parse_seed_arg("12345").expect("seed"), 12345);
        assert_eq!(parse_seed_arg("0x10").expect("seed"), 16);
        assert_eq!(parse_seed_arg("4294967301").expect("seed"), 5);
        assert!(parse_seed_arg("twelve").is_err());
    }

    #[test]
    fn explicit_grid_overrides_preset() {
        let args = PuzzleArgs {
            preset: Some("Expert".into()),
            rows: Some(3),
            cols: Some(5),
            seed: None,
        };
        assert_eq!(resolve_difficulty(&args).expect("difficulty"), Difficulty::new(3, 5));
        let args = PuzzleArgs {
            preset: Some("nope".into()),
            rows: None,
            cols: None,
            seed: None,
        };
        assert!(resolve_difficulty(&args).is_err());
    }

    #[test]
    fn svg_has_one_path_per_piece() {
        let canvas = CanvasArgs {
            width: 400.0,
            height: 300.0,
        };
        let difficulty = Difficulty::new(2, 3);
        let board = fit_board(canvas.width, canvas.height, &difficulty);
        let engine =
            AssemblyEngine::new(difficulty, 8, board, EngineRules::default(), InitMode::Complete)
                .expect("engine");
        let svg = render_svg(&engine, &canvas, true).expect("svg");
        assert_eq!(svg.matches("data-piece=").count(), 6);
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
