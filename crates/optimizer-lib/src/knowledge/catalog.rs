//! Knowledge catalog
//!
//! The corpus merged into the warehouse on every refresh. The built-in
//! catalog holds ten cement kiln articles; a JSON file can replace it.

use super::KnowledgeChunk;
use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// One catalog record before it is stamped with a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub chunk_id: String,
    pub topic: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub word_count: u32,
}

/// Validated set of knowledge entries with unique chunk ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeCatalog {
    entries: Vec<KnowledgeEntry>,
}

impl Default for KnowledgeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.chunk_id.as_str()) {
                return Err(CatalogError::DuplicateKey(entry.chunk_id.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Load a JSON array of entries
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&raw)?;
        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp every entry with the same batch id and timestamp
    pub fn stamp(&self, batch_id: Uuid, last_updated: DateTime<Utc>) -> Vec<KnowledgeChunk> {
        self.entries
            .iter()
            .map(|entry| KnowledgeChunk {
                chunk_id: entry.chunk_id.clone(),
                topic: entry.topic.clone(),
                title: entry.title.clone(),
                content: entry.content.clone(),
                url: entry.url.clone(),
                word_count: entry.word_count,
                batch_id,
                last_updated,
            })
            .collect()
    }
}

fn entry(
    chunk_id: &str,
    topic: &str,
    title: &str,
    content: &str,
    anchor: &str,
    word_count: u32,
) -> KnowledgeEntry {
    KnowledgeEntry {
        chunk_id: chunk_id.to_string(),
        topic: topic.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        url: format!("https://grokipedia.com/page/Cement_kiln#{}", anchor),
        word_count,
    }
}

/// The ten Grokipedia cement kiln chunks
pub fn builtin_entries() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            "chunk_001",
            "Energy_reduction",
            "Energy Reduction Strategies",
            "Modern dry-process cement kilns with multi-stage cyclone preheaters reduce thermal energy consumption to 3,100-3,500 MJ per tonne of clinker through optimized heat recovery that preheats raw meal to 800–900°C. Grate coolers recover 20-25% of total process heat by quenching hot clinker and supplying preheated secondary air for combustion.",
            "Energy_Efficiency",
            120,
        ),
        entry(
            "chunk_002",
            "CO2_emissions",
            "CO₂ Emissions Reduction",
            "The cement industry contributes 6-8% of global anthropogenic CO₂ emissions, totaling approximately 2.3 billion metric tons annually. Process emissions from limestone calcination account for 60-70% while fuel combustion contributes the balance. Alternative fuels can achieve thermal substitution rates up to 85% in advanced burners.",
            "Environmental_Impacts",
            130,
        ),
        entry(
            "chunk_003",
            "Kiln_optimization",
            "Cement Kiln Temperature Control",
            "A cement kiln operates at peak temperatures exceeding 1,450°C where raw materials undergo calcination and clinkering reactions. The burning zone requires precise temperature control within ±10°C to prevent ring formations and maintain clinker quality. Kiln efficiency depends on temperature uniformity, residence time, and material feed consistency.",
            "Core_Components",
            150,
        ),
        entry(
            "chunk_004",
            "Quality_control",
            "Quality Consistency Management",
            "Cement quality depends on chemical composition (LSF 90-100, SM 2.0-3.0) and physical properties (Blaine fineness 3200-3800 cm²/g). Real-time monitoring of raw feed variability enables proactive adjustments to grinding and blending. Predictive models can reduce quality variability by 20-30% through early detection of chemistry drift.",
            "Quality_Assurance",
            140,
        ),
        entry(
            "chunk_005",
            "Alternative_fuels",
            "Alternative Fuel Integration",
            "Alternative fuels in cement kilns include refuse-derived fuel (RDF), shredded tires, biomass, and industrial waste. Thermal substitution rates in Europe average 53% with some facilities achieving 85%. High combustion temperatures enable complete destruction of organic contaminants. Challenges include flame stability and alkali buildup.",
            "Alternative_Fuels",
            145,
        ),
        entry(
            "chunk_006",
            "Preheaters",
            "Preheater Efficiency Optimization",
            "Suspension preheaters with 4-6 cyclone stages achieve 80%+ heat recovery efficiency by preheating raw meal in countercurrent gas flow. Each stage facilitates gas-solid separation via centrifugal force. Precalciners enable 85-95% calcination before kiln entry, reducing thermal load and enabling compact kiln designs with capacities exceeding 5,000 tpd.",
            "Preheaters_Precalciners",
            135,
        ),
        entry(
            "chunk_007",
            "Dust_control",
            "Dust and PM Emission Control",
            "Bag filters and electrostatic precipitators achieve PM emission levels below 20 mg/Nm³ through >99% capture efficiency. Differential pressure across bag filters indicates cleaning cycle needs. Stack temperature monitoring helps optimize ID fan power consumption. Reverse-cycle timing affects both PM control and energy efficiency.",
            "Environmental_Controls",
            125,
        ),
        entry(
            "chunk_008",
            "Heat_recovery",
            "Waste Heat Recovery Systems",
            "Waste heat from preheater exhaust and clinker coolers represents 30-40% of total thermal input. Organic Rankine Cycle systems can generate 20-35 kWh per ton of clinker, offsetting 25-30% of plant electricity demand. Payback periods range from 2-4 years in facilities processing over 1 Mt/year.",
            "Heat_Recovery",
            128,
        ),
        entry(
            "chunk_009",
            "Mill_optimization",
            "Grinding Circuit Optimization",
            "Cement grinding accounts for 30-40% of total plant electrical energy. Optimal mill load balancing and separator speed control can reduce specific energy consumption by 5-10%. Ball mill efficiency depends on fill level, liner condition, and particle size distribution. High-efficiency separators improve fineness control.",
            "Grinding_Systems",
            132,
        ),
        entry(
            "chunk_010",
            "Digital_twin",
            "AI and Digital Twin Applications",
            "Digital twins integrate IoT sensor data with physics-based models to enable real-time process optimization. Machine learning models predict clinker quality metrics with >85% accuracy. Reinforcement learning optimizes fuel-air ratios, achieving 3-5% energy reductions. Vision AI enables non-contact temperature profiling with ±10°C precision.",
            "Digitalization",
            142,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_has_ten_unique_chunks() {
        let catalog = KnowledgeCatalog::builtin();
        assert_eq!(catalog.len(), 10);

        let ids: HashSet<_> = catalog.entries().iter().map(|e| &e.chunk_id).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(catalog.entries()[0].chunk_id, "chunk_001");
        assert_eq!(catalog.entries()[9].word_count, 142);
        assert!(catalog.entries()[6]
            .url
            .ends_with("#Environmental_Controls"));
    }

    #[test]
    fn test_duplicate_chunk_ids_rejected() {
        let mut entries = builtin_entries();
        entries[3].chunk_id = "chunk_001".to_string();

        let err = KnowledgeCatalog::from_entries(entries).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey(id) if id == "chunk_001"));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            KnowledgeCatalog::from_entries(vec![]),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"chunk_id":"kb_1","topic":"Kilns","title":"Rings","content":"Ring formation.","url":"https://example.org/rings","word_count":2}}]"#
        )
        .unwrap();

        let catalog = KnowledgeCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].chunk_id, "kb_1");
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = KnowledgeCatalog::load("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }

    #[test]
    fn test_stamp_applies_one_batch_to_every_chunk() {
        let batch_id = Uuid::new_v4();
        let now = Utc::now();
        let chunks = KnowledgeCatalog::builtin().stamp(batch_id, now);

        assert_eq!(chunks.len(), 10);
        assert!(chunks
            .iter()
            .all(|c| c.batch_id == batch_id && c.last_updated == now));
        assert_eq!(chunks[1].title, "CO₂ Emissions Reduction");
    }
}
