//! Material and option catalog: immutable lookup tables, no behaviour
//! beyond fail-closed lookups.

use crate::{
    BagType, CatalogGapError, FilmStructureLayer, MaterialFamily, ThicknessBand, ValidationError,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static STANDARD: Lazy<Catalog> = Lazy::new(Catalog::default);

/// A printable laminate offered in the quoting wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub family: MaterialFamily,
    /// Price multiplier relative to the reference laminate.
    pub base_multiplier: Decimal,
    /// Laminate stack for each offered thickness band.
    pub stacks: BTreeMap<ThicknessBand, Vec<FilmStructureLayer>>,
}

/// Per-bag-type conversion cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagTypeSpec {
    /// Yen per piece (per metre for roll film).
    pub processing_per_unit: Decimal,
}

/// All lookup tables. Loaded once and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub materials: BTreeMap<String, MaterialSpec>,
    pub thickness_multipliers: BTreeMap<MaterialFamily, BTreeMap<ThicknessBand, Decimal>>,
    /// Film densities in g/cm³ keyed by layer material id.
    pub densities: BTreeMap<String, Decimal>,
    pub post_processing: BTreeMap<String, Decimal>,
    pub bag_types: BTreeMap<BagType, BagTypeSpec>,
}

fn layer(material_id: &str, thickness_um: u32) -> FilmStructureLayer {
    FilmStructureLayer {
        material_id: material_id.to_string(),
        thickness_um,
    }
}

/// Build band -> stack, where only the sealant thickness varies by band.
fn stacks(
    outer: &[(&str, u32)],
    sealant: &str,
    bands: &[(ThicknessBand, u32)],
) -> BTreeMap<ThicknessBand, Vec<FilmStructureLayer>> {
    bands
        .iter()
        .map(|&(band, sealant_um)| {
            let mut layers: Vec<_> = outer.iter().map(|&(m, t)| layer(m, t)).collect();
            layers.push(layer(sealant, sealant_um));
            (band, layers)
        })
        .collect()
}

fn dec(value: i64, scale: u32) -> Decimal {
    Decimal::new(value, scale)
}

impl Default for Catalog {
    fn default() -> Self {
        use ThicknessBand::*;

        let foil_bands = [(Light, 60), (Medium, 80), (Heavy, 100), (Ultra, 110)];
        let three_bands = [(Light, 60), (Medium, 80), (Heavy, 100)];

        let mut materials = BTreeMap::new();
        materials.insert(
            "pet_al".to_string(),
            MaterialSpec {
                family: MaterialFamily::Aluminum,
                base_multiplier: dec(100, 2),
                stacks: stacks(&[("PET", 12), ("AL", 7)], "LLDPE", &foil_bands),
            },
        );
        materials.insert(
            "opp_al".to_string(),
            MaterialSpec {
                family: MaterialFamily::Aluminum,
                base_multiplier: dec(115, 2),
                stacks: stacks(&[("PET", 12), ("AL", 7), ("PET", 12)], "LLDPE", &foil_bands),
            },
        );
        materials.insert(
            "pet_ny_al".to_string(),
            MaterialSpec {
                family: MaterialFamily::Aluminum,
                base_multiplier: dec(125, 2),
                stacks: stacks(&[("PET", 12), ("NY", 15), ("AL", 7)], "LLDPE", &foil_bands),
            },
        );
        materials.insert(
            "pet_vmpet".to_string(),
            MaterialSpec {
                family: MaterialFamily::VaporDeposited,
                base_multiplier: dec(90, 2),
                stacks: stacks(&[("PET", 12), ("VMPET", 12)], "LLDPE", &three_bands),
            },
        );
        materials.insert(
            "pet_transparent".to_string(),
            MaterialSpec {
                family: MaterialFamily::Transparent,
                base_multiplier: dec(75, 2),
                stacks: stacks(&[("PET", 12)], "LLDPE", &[(Light, 40), (Medium, 60), (Heavy, 80)]),
            },
        );
        materials.insert(
            "kraft_pe".to_string(),
            MaterialSpec {
                family: MaterialFamily::Paper,
                base_multiplier: dec(80, 2),
                stacks: [(Light, 70, 30), (Medium, 80, 40), (Heavy, 90, 50)]
                    .into_iter()
                    .map(|(band, kraft, pe)| (band, vec![layer("KRAFT", kraft), layer("PE", pe)]))
                    .collect(),
            },
        );

        let band_table = |rates: &[(ThicknessBand, i64)]| -> BTreeMap<ThicknessBand, Decimal> {
            rates.iter().map(|&(b, r)| (b, dec(r, 2))).collect()
        };
        let mut thickness_multipliers = BTreeMap::new();
        thickness_multipliers.insert(
            MaterialFamily::Aluminum,
            band_table(&[(Light, 90), (Medium, 100), (Heavy, 110), (Ultra, 120)]),
        );
        thickness_multipliers.insert(
            MaterialFamily::VaporDeposited,
            band_table(&[(Light, 90), (Medium, 100), (Heavy, 110)]),
        );
        thickness_multipliers.insert(
            MaterialFamily::Transparent,
            band_table(&[(Light, 90), (Medium, 100), (Heavy, 110)]),
        );
        thickness_multipliers.insert(
            MaterialFamily::Paper,
            band_table(&[(Light, 90), (Medium, 100), (Heavy, 110)]),
        );

        let densities = [
            ("PET", 140),
            ("AL", 271),
            ("LLDPE", 92),
            ("NY", 116),
            ("VMPET", 140),
            ("PE", 92),
            ("KRAFT", 80),
            ("CPP", 90),
            ("OPP", 91),
        ]
        .into_iter()
        .map(|(id, d)| (id.to_string(), dec(d, 2)))
        .collect();

        let post_processing = [
            ("zipper-yes", 112),
            ("zipper-no", 100),
            ("valve-yes", 108),
            ("valve-no", 100),
            ("glossy", 106),
            ("matte", 104),
            ("notch-yes", 103),
            ("notch-no", 100),
            ("corner-round", 105),
            ("corner-square", 100),
            ("hang-hole-6mm", 104),
            ("hang-hole-8mm", 105),
            ("hang-hole-no", 100),
        ]
        .into_iter()
        .map(|(id, m)| (id.to_string(), dec(m, 2)))
        .collect();

        let bag_types = [
            (BagType::FlatThreeSide, 15),
            (BagType::FlatWithZipper, 20),
            (BagType::StandUp, 18),
            (BagType::StandUpZipper, 22),
            (BagType::Box, 22),
            (BagType::MShape, 22),
            (BagType::TShape, 20),
            (BagType::Spout, 25),
            (BagType::RollFilm, 3),
        ]
        .into_iter()
        .map(|(bag, cost)| {
            (
                bag,
                BagTypeSpec {
                    processing_per_unit: dec(cost, 0),
                },
            )
        })
        .collect();

        Self {
            materials,
            thickness_multipliers,
            densities,
            post_processing,
            bag_types,
        }
    }
}

impl Catalog {
    /// Shared immutable default catalog.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    /// Parse a YAML catalog. Tables omitted from the document keep the
    /// standard entries.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let catalog: Catalog =
            serde_yaml::from_str(text).map_err(|e| ValidationError::InvalidPolicy(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Cross-check that every material stack resolves to known densities and
    /// every material family has a thickness table.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (id, spec) in &self.materials {
            if spec.base_multiplier <= Decimal::ZERO {
                return Err(ValidationError::InvalidPolicy(format!(
                    "material {id} has a non-positive multiplier"
                )));
            }
            if !self.thickness_multipliers.contains_key(&spec.family) {
                return Err(ValidationError::InvalidPolicy(format!(
                    "material {id} family has no thickness table"
                )));
            }
            for layers in spec.stacks.values() {
                if let Some(l) = layers.iter().find(|l| !self.densities.contains_key(&l.material_id)) {
                    return Err(ValidationError::InvalidPolicy(format!(
                        "material {id} uses {} without a density",
                        l.material_id
                    )));
                }
            }
        }
        if let Some((id, _)) = self.post_processing.iter().find(|(_, m)| **m < Decimal::ONE) {
            return Err(ValidationError::InvalidPolicy(format!(
                "post-processing {id} multiplier below 1"
            )));
        }
        Ok(())
    }

    pub fn material(&self, id: &str) -> Result<&MaterialSpec, CatalogGapError> {
        self.materials
            .get(id)
            .ok_or_else(|| CatalogGapError::UnknownMaterial(id.to_string()))
    }

    /// Thickness multiplier for a material's family and band.
    pub fn thickness_multiplier(
        &self,
        material_id: &str,
        band: ThicknessBand,
    ) -> Result<Decimal, CatalogGapError> {
        let spec = self.material(material_id)?;
        self.thickness_multipliers
            .get(&spec.family)
            .and_then(|bands| bands.get(&band))
            .copied()
            .ok_or_else(|| CatalogGapError::UnknownThickness {
                material: material_id.to_string(),
                band: band.as_str().to_string(),
            })
    }

    /// Laminate stack for a material at a thickness band.
    pub fn film_stack(
        &self,
        material_id: &str,
        band: ThicknessBand,
    ) -> Result<&[FilmStructureLayer], CatalogGapError> {
        self.material(material_id)?
            .stacks
            .get(&band)
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogGapError::UnknownThickness {
                material: material_id.to_string(),
                band: band.as_str().to_string(),
            })
    }

    pub fn density(&self, film_material_id: &str) -> Result<Decimal, CatalogGapError> {
        self.densities
            .get(film_material_id)
            .copied()
            .ok_or_else(|| CatalogGapError::UnknownFilmMaterial(film_material_id.to_string()))
    }

    pub fn post_processing_multiplier(&self, option_id: &str) -> Result<Decimal, CatalogGapError> {
        self.post_processing
            .get(option_id)
            .copied()
            .ok_or_else(|| CatalogGapError::UnknownPostProcessing(option_id.to_string()))
    }

    /// Combined post-processing multiplier: increments add, starting at 1.
    pub fn combined_post_processing(&self, option_ids: &[String]) -> Result<Decimal, CatalogGapError> {
        option_ids.iter().try_fold(Decimal::ONE, |acc, id| {
            Ok(acc + (self.post_processing_multiplier(id)? - Decimal::ONE))
        })
    }

    pub fn processing_per_unit(&self, bag_type: BagType) -> Result<Decimal, CatalogGapError> {
        self.bag_types
            .get(&bag_type)
            .map(|b| b.processing_per_unit)
            .ok_or_else(|| CatalogGapError::UnknownBagType(bag_type.as_str().to_string()))
    }
}
