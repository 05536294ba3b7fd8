use crate::cli::GenotypeArgs;
use crate::cross::writers::{PopulationWindowRow, TableWriter};
use crate::cross::{CrossGenotyper, SegregatingSites};
use crate::inputs::{read_sample, ReferencePanel, SampleMatrix};
use crate::utils::{GenomeLayout, Result};
use rayon::ThreadPoolBuilder;

pub fn genotype(args: GenotypeArgs) -> Result<()> {
    let layout = GenomeLayout::new(&args.genome)?;
    let sites = load_segregating_sites(&args)?;
    let genotyper = CrossGenotyper::new(sites, &layout, args.window_len, args.lr_threshold)?;
    let mut writer = TableWriter::new(&args.output_path)?;

    if let Some(input_path) = &args.input_path {
        let sample = read_sample(input_path)?;
        for row in genotyper.genotype_sample(&sample)? {
            writer.write_line(&row.to_line())?;
        }
    } else if let Some(population_path) = &args.population_path {
        let matrix = SampleMatrix::from_path(population_path, args.good_samples_path.as_deref())?;
        log::debug!("Initializing thread pool with {} threads...", args.num_threads);
        let pool = initialize_thread_pool(args.num_threads)?;
        let rows = pool.install(|| genotyper.genotype_population(&matrix))?;
        writer.write_line(&PopulationWindowRow::header(matrix.num_samples()))?;
        for row in rows {
            writer.write_line(&row.to_line())?;
        }
    }

    writer.finish()?;
    log::info!("Finished genotyping: {}", args.output_path);
    Ok(())
}

fn load_segregating_sites(args: &GenotypeArgs) -> Result<SegregatingSites> {
    match (&args.panel_path, &args.parents, &args.parent_paths) {
        (Some(panel_path), Some(parents), _) => {
            let panel = ReferencePanel::from_path(panel_path)?;
            SegregatingSites::from_panel(&panel, parents)
        }
        (_, _, Some(paths)) if paths.len() == 2 => {
            let parent1 = read_sample(&paths[0])?;
            let parent2 = read_sample(&paths[1])?;
            Ok(SegregatingSites::from_parent_samples(&parent1, &parent2))
        }
        _ => Err("Provide the parents either as --panel with --parents or as two --parent-files".to_string()),
    }
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("snpcross-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args(dir: &tempfile::TempDir) -> GenotypeArgs {
        let mut panel = String::from("chrom\tpos\tP1\tP2\n");
        let mut population = String::from("chrom\tpos\tF2_1\tF2_2\tF2_3\n");
        for pos in 1..=20 {
            panel.push_str(&format!("1\t{}\t0\t1\n", pos * 5));
            population.push_str(&format!("1\t{}\t0/0\t0/1\t1/1\n", pos * 5));
        }
        GenotypeArgs {
            panel_path: Some(write(dir, "panel.tsv", &panel)),
            parents: Some("P1xP2".to_string()),
            parent_paths: None,
            input_path: None,
            population_path: Some(write(dir, "population.tsv", &population)),
            good_samples_path: Some(write(dir, "good.txt", "F21\nF23\n")),
            output_path: dir.path().join("out.csv").to_str().unwrap().to_string(),
            window_len: 50,
            num_threads: 2,
            genome: write(dir, "genome.txt", "1 200 4.0\n").to_str().unwrap().to_string(),
            lr_threshold: 2.706,
        }
    }

    #[test]
    fn genotypes_a_filtered_population() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(&dir);
        let output = args.output_path.clone();
        genotype(args).unwrap();

        let written = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "pheno,,,0,0");
        assert!(lines[1].starts_with("1,1,"));
        assert!(lines[1].ends_with(",0,2"));
    }

    #[test]
    fn parents_from_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(&dir);
        args.panel_path = None;
        args.parents = None;
        args.parent_paths = Some(vec![
            write(&dir, "p1.bed", "1\t5\t0/0\n1\t10\t0/0\n"),
            write(&dir, "p2.bed", "1\t5\t1/1\n1\t10\t0/0\n"),
        ]);
        let sites = load_segregating_sites(&args).unwrap();
        assert_eq!(sites.positions, vec![5]);
    }
}
