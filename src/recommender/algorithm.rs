//! Closed catalogue of scorer configurations
//!
//! Each configuration names the feature it produces and resolves, once, into a boxed
//! [`Recommender`] over a graph.

use crate::error::ConfigError;
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::standalone::{self, MoneyMode};
use crate::recommender::{Recommender, SimilarityRecommender};
use crate::similarity::{
    FoafMetric, FoafSimilarity, IndexSimilarity, IrModel, IrSimilarity, MemoryIndex, WeightingModel,
};
use serde::{Deserialize, Serialize};

fn default_iterations() -> usize {
    20
}

/// One configured scorer, as written in the JSON run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    Mcn {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Jaccard {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Adamic {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        w_sel: EdgeOrientation,
    },
    Cosine {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Bm25 {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        /// Orientation of the document lengths, `v_sel` when absent
        #[serde(default)]
        dl_sel: Option<EdgeOrientation>,
        b: f64,
        k: f64,
    },
    Ebm25 {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        #[serde(default)]
        dl_sel: Option<EdgeOrientation>,
        b: f64,
    },
    Bir {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Qljm {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        lambda: f64,
    },
    Qld {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        mu: f64,
    },
    Qll {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        gamma: f64,
    },
    Vsm {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Pl2 {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        c: f64,
    },
    Dlh {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    Dph {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    #[serde(rename = "dfree")]
    DfRee {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    #[serde(rename = "dfree_klim")]
    DfReeKlim {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    #[serde(rename = "pagerank")]
    PersonalizedPageRank { r: f64 },
    Money { mode: MoneyMode, alpha: f64 },
    Imf {
        k: usize,
        lambda: f64,
        alpha: f64,
        #[serde(default = "default_iterations")]
        iterations: usize,
        #[serde(default)]
        seed: u64,
    },
    Popularity,
    Random {
        #[serde(default)]
        seed: u64,
    },
}

/// Numeric parameter in feature names, always with a decimal point
fn num(value: f64) -> String {
    format!("{value:?}")
}

impl AlgorithmConfig {
    /// Feature name, unique per configuration
    pub fn name(&self) -> String {
        use AlgorithmConfig::*;
        match self {
            Mcn { u_sel, v_sel } => format!("MCN_{u_sel}_{v_sel}"),
            Jaccard { u_sel, v_sel } => format!("Jaccard_{u_sel}_{v_sel}"),
            Adamic { u_sel, v_sel, w_sel } => format!("Adamic_{u_sel}_{v_sel}_{w_sel}"),
            Cosine { u_sel, v_sel } => format!("Cosine_{u_sel}_{v_sel}"),
            Bm25 {
                u_sel,
                v_sel,
                dl_sel,
                b,
                k,
            } => format!(
                "BM25_{u_sel}_{v_sel}_{}_{}_{}",
                dl_sel.unwrap_or(*v_sel),
                num(*b),
                num(*k)
            ),
            Ebm25 { u_sel, v_sel, dl_sel, b } => {
                format!("EBM25_{u_sel}_{v_sel}_{}_{}", dl_sel.unwrap_or(*v_sel), num(*b))
            }
            Bir { u_sel, v_sel } => format!("BIR_{u_sel}_{v_sel}"),
            Qljm { u_sel, v_sel, lambda } => format!("QLJM_{u_sel}_{v_sel}_{}", num(*lambda)),
            Qld { u_sel, v_sel, mu } => format!("QLD_{u_sel}_{v_sel}_{}", num(*mu)),
            Qll { u_sel, v_sel, gamma } => format!("QLL_{u_sel}_{v_sel}_{}", num(*gamma)),
            Vsm { u_sel, v_sel } => format!("VSM_{u_sel}_{v_sel}"),
            Pl2 { u_sel, v_sel, c } => format!("PL2_{u_sel}_{v_sel}_{}", num(*c)),
            Dlh { u_sel, v_sel } => format!("DLH_{u_sel}_{v_sel}"),
            Dph { u_sel, v_sel } => format!("DPH_{u_sel}_{v_sel}"),
            DfRee { u_sel, v_sel } => format!("DFRee_{u_sel}_{v_sel}"),
            DfReeKlim { u_sel, v_sel } => format!("DFReeKLIM_{u_sel}_{v_sel}"),
            PersonalizedPageRank { r } => format!("Personalized PageRank_{}", num(*r)),
            Money { mode, alpha } => format!("Money_{mode}_{}", num(*alpha)),
            Imf { k, lambda, alpha, .. } => format!("iMF_{k}_{}_{}", num(*lambda), num(*alpha)),
            Popularity => "Popularity".to_string(),
            Random { seed } => format!("Random_{seed}"),
        }
    }

    fn invalid(&self, parameter: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
        ConfigError::InvalidParameter {
            algorithm: self.name(),
            parameter,
            value: value.to_string(),
            expected,
        }
    }

    fn check(&self, parameter: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<(), ConfigError> {
        if ok && value.is_finite() {
            Ok(())
        } else {
            Err(self.invalid(parameter, value, expected))
        }
    }

    /// Rejects parameter values the scorer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        use AlgorithmConfig::*;
        match *self {
            Bm25 { b, k, .. } => {
                self.check("b", b, (0.0..=1.0).contains(&b), "within [0, 1]")?;
                self.check("k", k, k > 0.0, "positive")
            }
            Ebm25 { b, .. } => self.check("b", b, (0.0..=1.0).contains(&b), "within [0, 1]"),
            Qljm { lambda, .. } => self.check("lambda", lambda, lambda > 0.0 && lambda < 1.0, "within (0, 1)"),
            Qld { mu, .. } => self.check("mu", mu, mu > 0.0, "positive"),
            Qll { gamma, .. } => self.check("gamma", gamma, gamma > 0.0, "positive"),
            Pl2 { c, .. } => self.check("c", c, c > 0.0, "positive"),
            PersonalizedPageRank { r } => self.check("r", r, (0.0..=1.0).contains(&r), "within [0, 1]"),
            Money { alpha, .. } => self.check("alpha", alpha, (0.0..=1.0).contains(&alpha), "within [0, 1]"),
            Imf {
                k,
                lambda,
                alpha,
                iterations,
                ..
            } => {
                if k == 0 {
                    return Err(self.invalid("k", k, "at least 1"));
                }
                if iterations == 0 {
                    return Err(self.invalid("iterations", iterations, "at least 1"));
                }
                self.check("lambda", lambda, lambda > 0.0, "positive")?;
                self.check("alpha", alpha, alpha >= 0.0, "non-negative")
            }
            _ => Ok(()),
        }
    }

    /// Resolves the configuration into a scorer over `graph`
    pub fn build<'g>(&self, graph: &'g IndexedGraph) -> Result<Box<dyn Recommender + 'g>, ConfigError> {
        use AlgorithmConfig::*;
        self.validate()?;

        let foaf = |metric, u_sel, v_sel| -> Box<dyn Recommender + 'g> {
            Box::new(SimilarityRecommender::new(FoafSimilarity::new(graph, metric, u_sel, v_sel)))
        };
        let ir = |model, u_sel, v_sel, dl_sel: Option<EdgeOrientation>| -> Box<dyn Recommender + 'g> {
            let dl_sel = dl_sel.unwrap_or(v_sel);
            Box::new(SimilarityRecommender::new(IrSimilarity::with_length_orientation(
                graph, model, u_sel, v_sel, dl_sel,
            )))
        };
        let dfr = |model, u_sel, v_sel, c| -> Box<dyn Recommender + 'g> {
            let index = MemoryIndex::build(graph, u_sel, v_sel);
            Box::new(SimilarityRecommender::new(IndexSimilarity::new(index, model, c)))
        };

        let recommender = match *self {
            Mcn { u_sel, v_sel } => foaf(FoafMetric::MostCommonNeighbors, u_sel, v_sel),
            Jaccard { u_sel, v_sel } => foaf(FoafMetric::Jaccard, u_sel, v_sel),
            Adamic { u_sel, v_sel, w_sel } => foaf(FoafMetric::AdamicAdar { w_sel }, u_sel, v_sel),
            Cosine { u_sel, v_sel } => foaf(FoafMetric::Cosine, u_sel, v_sel),
            Bm25 {
                u_sel,
                v_sel,
                dl_sel,
                b,
                k,
            } => ir(IrModel::Bm25 { b, k }, u_sel, v_sel, dl_sel),
            Ebm25 { u_sel, v_sel, dl_sel, b } => ir(IrModel::ExtremeBm25 { b }, u_sel, v_sel, dl_sel),
            Bir { u_sel, v_sel } => ir(IrModel::Bir, u_sel, v_sel, None),
            Qljm { u_sel, v_sel, lambda } => ir(IrModel::QlJelinekMercer { lambda }, u_sel, v_sel, None),
            Qld { u_sel, v_sel, mu } => ir(IrModel::QlDirichlet { mu }, u_sel, v_sel, None),
            Qll { u_sel, v_sel, gamma } => ir(IrModel::QlLaplace { gamma }, u_sel, v_sel, None),
            Vsm { u_sel, v_sel } => ir(IrModel::Vsm, u_sel, v_sel, None),
            Pl2 { u_sel, v_sel, c } => dfr(WeightingModel::PL2, u_sel, v_sel, Some(c)),
            Dlh { u_sel, v_sel } => dfr(WeightingModel::DLH, u_sel, v_sel, None),
            Dph { u_sel, v_sel } => dfr(WeightingModel::DPH, u_sel, v_sel, None),
            DfRee { u_sel, v_sel } => dfr(WeightingModel::DFRee, u_sel, v_sel, None),
            DfReeKlim { u_sel, v_sel } => dfr(WeightingModel::DFReeKLIM, u_sel, v_sel, None),
            PersonalizedPageRank { r } => Box::new(standalone::PersonalizedPageRank::new(graph, r)),
            Money { mode, alpha } => Box::new(standalone::Money::new(graph, mode, alpha)),
            Imf {
                k,
                lambda,
                alpha,
                iterations,
                seed,
            } => Box::new(standalone::ImplicitMf::train(graph, k, lambda, alpha, iterations, seed)),
            Popularity => Box::new(standalone::Popularity::new(graph)),
            Random { seed } => Box::new(standalone::RandomScores::new(graph, seed)),
        };
        Ok(recommender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::fixtures::follow_graph;
    use pretty_assertions::assert_eq;
    use EdgeOrientation::{In, Out, Und};

    #[test]
    fn parses_tagged_json() {
        let json = r#"[
            {"algorithm": "bm25", "u_sel": "OUT", "v_sel": "IN", "b": 0.75, "k": 1.2},
            {"algorithm": "money", "mode": "auth", "alpha": 0.3},
            {"algorithm": "imf", "k": 10, "lambda": 0.1, "alpha": 40.0},
            {"algorithm": "dfree_klim", "u_sel": "UND", "v_sel": "UNDIRECTED"},
            {"algorithm": "popularity"}
        ]"#;
        let configs: Vec<AlgorithmConfig> = serde_json::from_str(json).unwrap();
        let names: Vec<String> = configs.iter().map(AlgorithmConfig::name).collect();
        assert_eq!(
            names,
            vec![
                "BM25_OUT_IN_IN_0.75_1.2",
                "Money_auth_0.3",
                "iMF_10_0.1_40.0",
                "DFReeKLIM_UND_UND",
                "Popularity",
            ]
        );
        assert!(matches!(configs[2], AlgorithmConfig::Imf { iterations: 20, seed: 0, .. }));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let bad = [
            AlgorithmConfig::Bm25 {
                u_sel: Out,
                v_sel: In,
                dl_sel: None,
                b: 1.5,
                k: 1.0,
            },
            AlgorithmConfig::Qljm {
                u_sel: Out,
                v_sel: In,
                lambda: 1.0,
            },
            AlgorithmConfig::Qld {
                u_sel: Out,
                v_sel: In,
                mu: f64::NAN,
            },
            AlgorithmConfig::Money {
                mode: MoneyMode::Hubs,
                alpha: -0.1,
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter { .. })), "{config:?}");
        }
    }

    #[test]
    fn every_family_builds() {
        let g = follow_graph();
        let configs = vec![
            AlgorithmConfig::Mcn { u_sel: Out, v_sel: In },
            AlgorithmConfig::Adamic {
                u_sel: Und,
                v_sel: Und,
                w_sel: In,
            },
            AlgorithmConfig::Vsm { u_sel: Out, v_sel: Out },
            AlgorithmConfig::Pl2 {
                u_sel: Out,
                v_sel: In,
                c: 1.0,
            },
            AlgorithmConfig::PersonalizedPageRank { r: 0.2 },
            AlgorithmConfig::Imf {
                k: 2,
                lambda: 0.1,
                alpha: 1.0,
                iterations: 2,
                seed: 1,
            },
            AlgorithmConfig::Random { seed: 5 },
        ];
        for config in configs {
            let rec = config.build(&g).unwrap();
            let ranking = rec.recommend(0, &|v: u32| v != 0, 3);
            assert!(ranking.len() <= 3, "{}", config.name());
        }
    }
}
