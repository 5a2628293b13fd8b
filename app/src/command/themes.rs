use kbforge_core::ThemeRegistry;
use kbforge_extractors::ExtractorRegistry;

/// Strategy for listing every theme the registered extractors declare.
#[derive(Debug, Clone, Copy)]
pub struct ThemesStrategy;

impl super::CommandStrategy for ThemesStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let registry = ExtractorRegistry::with_builtin();
        let themes = ThemeRegistry::new();
        let extractors = registry.all(&themes)?;

        println!("=== kbforge themes ===\n");
        for theme in themes.all() {
            let language = theme.language().unwrap_or("-");
            let exported = if theme.is_final() { "final" } else { "internal" };
            println!(
                "{:<28} {:<14} {:<4} {:<9} {}",
                theme.name(),
                theme.group().as_str(),
                language,
                exported,
                theme.description()
            );
        }

        println!("\n=== producers ===\n");
        for extractor in &extractors {
            let outputs: Vec<String> = extractor.output().iter().map(ToString::to_string).collect();
            println!("{:<24} -> {}", extractor.name(), outputs.join(", "));
        }
        Ok(())
    }
}
