use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use matcard::assets::materials::{CardLoader, LoadedCard, MaterialLibrary};
use matcard::config::Config;
use matcard::core::config::ApplicationConfig;
use matcard::foundation::logging;
use matcard::render::material::value::parse_color;
use matcard::render::material::{MaterialResolver, PassthroughAssembler, ResolutionContext, StandardMaterial};
use matcard::render::plugins::{MaterialExporter, RendererRegistry};

const DEFAULT_OBJECT_NAME: &str = "Object";
const DEFAULT_OBJECT_COLOR: &str = "0.8,0.8,0.8";

fn cli() -> Command {
    Command::new("matcard")
        .about("Inspects material cards and writes them for renderers")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (.toml or .ron)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace)")
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show what a material card defines")
                .arg(Arg::new("card").value_name("CARD").required(true).help("Material card file")),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a card for a renderer and print the renderer material")
                .arg(Arg::new("card").value_name("CARD").required(true).help("Material card file"))
                .arg(
                    Arg::new("renderer")
                        .short('r')
                        .long("renderer")
                        .value_name("NAME")
                        .required(true)
                        .help("Renderer name (exact, case-sensitive)"),
                )
                .arg(
                    Arg::new("object")
                        .short('o')
                        .long("object")
                        .value_name("NAME")
                        .help("Object name used for %NAME%")
                        .default_value(DEFAULT_OBJECT_NAME),
                )
                .arg(
                    Arg::new("color")
                        .long("color")
                        .value_name("R,G,B")
                        .help("Object color used for fallbacks and %RED%/%GREEN%/%BLUE%")
                        .default_value(DEFAULT_OBJECT_COLOR),
                )
                .arg(
                    Arg::new("library")
                        .short('l')
                        .long("library")
                        .value_name("DIR")
                        .help("Directory of cards used to find parent materials (repeatable)")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("renderers").about("List the available renderers"))
}

fn load_config(matches: &ArgMatches) -> Result<ApplicationConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => ApplicationConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => ApplicationConfig::default(),
    };
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    let level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.logging.log_level.clone());
    logging::init_with_level(&level);

    match matches.subcommand() {
        Some(("inspect", sub)) => inspect(sub, &config),
        Some(("resolve", sub)) => resolve(sub, &config),
        Some(("renderers", _)) => {
            for name in RendererRegistry::with_builtin_plugins().names() {
                println!("{}", name);
            }
            Ok(())
        }
        _ => Err(anyhow!("No command given, see --help")),
    }
}

fn load_card(sub: &ArgMatches, config: &ApplicationConfig) -> Result<LoadedCard> {
    let path = sub
        .get_one::<String>("card")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No card given"))?;
    CardLoader::load_with(&path, &config.parser).with_context(|| format!("Failed to load card {:?}", path))
}

fn inspect(sub: &ArgMatches, config: &ApplicationConfig) -> Result<()> {
    let card = load_card(sub, config)?;
    print!("{}", inspect_report(&card, config)?);
    Ok(())
}

/// Human-readable summary of a card
fn inspect_report(card: &LoadedCard, config: &ApplicationConfig) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Material: {}", card.name)?;
    if let Some(source) = &card.source {
        writeln!(out, "Source: {}", source.display())?;
    }
    writeln!(out, "Keys: {}", card.card.len())?;
    if let Some(parent) = card.card.get(&config.resolver.parent_key) {
        writeln!(out, "Parent: {}", parent)?;
    }

    let renderers = PassthroughAssembler::renderers(&card.card);
    if !renderers.is_empty() {
        writeln!(out, "Passthrough: {}", renderers.join(", "))?;
    }

    match StandardMaterial::from_card(&card.card, &card.name)? {
        Some(material) => {
            writeln!(out, "Type: {}", material.kind())?;
            for parameter in material.parameters() {
                if let Some(value) = &parameter.value {
                    let marker = if parameter.explicit { "" } else { " (default)" };
                    writeln!(out, "  {} = {}{}", parameter.name(), value, marker)?;
                }
            }
        }
        None => writeln!(out, "Type: none")?,
    }

    let textures = card.textures()?;
    for texture in textures.iter() {
        writeln!(out, "Texture: {}", texture.name)?;
        for (index, path) in &texture.images {
            let status = match texture.load_image(*index) {
                Ok(image) => format!("{}x{}, {} bytes", image.width, image.height, image.size_bytes()),
                Err(e) => format!("unreadable: {}", e),
            };
            writeln!(out, "  [{}] {} ({})", index, path.display(), status)?;
        }
    }

    Ok(out)
}

fn resolve(sub: &ArgMatches, config: &ApplicationConfig) -> Result<()> {
    let card = Arc::new(load_card(sub, config)?);

    let renderer = sub
        .get_one::<String>("renderer")
        .ok_or_else(|| anyhow!("No renderer given"))?;
    let object = sub
        .get_one::<String>("object")
        .map_or(DEFAULT_OBJECT_NAME, String::as_str);
    let color_text = sub
        .get_one::<String>("color")
        .map_or(DEFAULT_OBJECT_COLOR, String::as_str);
    let color = parse_color(color_text).map_err(|e| anyhow!("Invalid --color: {}", e))?;

    let mut library_config = config.library.clone();
    if let Some(dirs) = sub.get_many::<String>("library") {
        library_config.search_paths.extend(dirs.cloned());
    }
    let mut library = MaterialLibrary::new(library_config, config.parser.clone());
    let found = library.scan();
    log::info!("Material library: {} cards", found);

    let registry = RendererRegistry::with_builtin_plugins();
    let resolver = MaterialResolver::with_config(&library, config.resolver.clone());
    let exporter = MaterialExporter::new(&registry, resolver);

    let ctx = ResolutionContext::new(object, color);
    let text = exporter
        .export(renderer, Some(&card), &ctx)
        .with_context(|| format!("Available renderers: {}", registry.names().join(", ")))?;
    print!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_resolve_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "matcard", "resolve", "card.FCMat", "-r", "Ospray", "-l", "a", "-l", "b", "--log-level", "debug",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "resolve");
        assert_eq!(sub.get_one::<String>("renderer").unwrap(), "Ospray");
        assert_eq!(sub.get_one::<String>("object").unwrap(), DEFAULT_OBJECT_NAME);
        assert_eq!(sub.get_many::<String>("library").unwrap().count(), 2);
        assert_eq!(matches.get_one::<String>("log-level").unwrap(), "debug");
    }

    #[test]
    fn test_renderer_is_required() {
        assert!(cli().try_get_matches_from(["matcard", "resolve", "card.FCMat"]).is_err());
    }

    #[test]
    fn test_inspect_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Oak.FCMat");
        std::fs::write(
            &path,
            "[General]\nName = Oak\nFather = Wood\n[Rendering]\nRender.Type = Diffuse\nRender.Diffuse.Color = Texture(\"Grain\", 0)\nRender.Textures.Grain.Images.0 = grain.png\nRender.Ospray.0001 = type principled\n",
        )
        .unwrap();

        let config = ApplicationConfig::default();
        let card = CardLoader::load(&path).unwrap();
        let report = inspect_report(&card, &config).unwrap();

        assert!(report.starts_with("Material: Oak\n"));
        assert!(report.contains("Parent: Wood\n"));
        assert!(report.contains("Passthrough: Ospray\n"));
        assert!(report.contains("Type: Diffuse\n"));
        assert!(report.contains("  Color = Texture(\"Grain\", 0)\n"));
        assert!(report.contains("Texture: Grain\n"));
        assert!(report.contains("unreadable"));
    }
}
