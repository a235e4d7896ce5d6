// Gradient boosted trees from an XGBoost JSON model (`save_model("model.json")`).
//
// Only the parts needed for inference are read:
// learner.feature_names
// learner.learner_model_param.base_score
// learner.objective.name
// learner.gradient_booster.model.trees[*].{left_children, right_children,
//     split_indices, split_conditions, default_left}
use serde::Deserialize;

use super::{sigmoid, Classifier, ModelKind};
use crate::error::{ArtifactError, ClassifierError};

#[derive(Debug, Deserialize)]
struct ModelDocument {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    learner_model_param: LearnerModelParam,
    objective: Objective,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    model: BoosterModel,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    trees: Vec<TreeDocument>,
}

#[derive(Debug, Deserialize)]
struct TreeDocument {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

// Older dumps write booleans, newer ones write 0/1
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// XGBoost keeps split conditions and leaf weights in single precision
#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_document(index: usize, doc: TreeDocument) -> Result<Self, ArtifactError> {
        let n = doc.left_children.len();
        if [
            doc.right_children.len(),
            doc.split_indices.len(),
            doc.split_conditions.len(),
            doc.default_left.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(ArtifactError::Invalid(format!(
                "tree {index}: node arrays have different lengths"
            )));
        }
        if n == 0 {
            return Err(ArtifactError::Invalid(format!("tree {index}: no nodes")));
        }

        let child = |c: i32| -> Result<usize, ArtifactError> {
            usize::try_from(c)
                .ok()
                .filter(|&c| c < n)
                .ok_or_else(|| ArtifactError::Invalid(format!("tree {index}: child {c} out of range")))
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            // A leaf stores its value in split_conditions
            let node = if doc.left_children[i] == -1 {
                Node::Leaf(doc.split_conditions[i])
            } else {
                Node::Split {
                    feature: doc.split_indices[i] as usize,
                    threshold: doc.split_conditions[i],
                    left: child(doc.left_children[i])?,
                    right: child(doc.right_children[i])?,
                    default_left: doc.default_left[i].is_set(),
                }
            };
            nodes.push(node);
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, index: usize, row: &[f64]) -> Result<f64, ClassifierError> {
        let mut node = 0;
        // A well formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes[node] {
                Node::Leaf(value) => return Ok(f64::from(value)),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = *row.get(feature).ok_or_else(|| ClassifierError::MalformedTree {
                        tree: index,
                        reason: format!("split on feature {feature} beyond row width {}", row.len()),
                    })?;
                    node = if x.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if (x as f32) < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }

        Err(ClassifierError::MalformedTree {
            tree: index,
            reason: "cycle in node links".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BoostedTrees {
    feature_names: Option<Vec<String>>,
    num_features: Option<usize>,
    base_margin: f64,
    trees: Vec<Tree>,
}

impl BoostedTrees {
    pub(crate) fn from_json(document: serde_json::Value) -> Result<Self, ArtifactError> {
        let doc: ModelDocument = serde_json::from_value(document)?;
        let learner = doc.learner;

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let base_margin = match learner.objective.name.as_str() {
            "binary:logistic" => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(ArtifactError::Invalid(format!(
                        "base_score {base_score} is not a probability"
                    )));
                }
                (base_score / (1.0 - base_score)).ln()
            }
            "binary:logitraw" => base_score,
            other => return Err(ArtifactError::Objective(other.to_string())),
        };

        let num_features = learner
            .learner_model_param
            .num_feature
            .as_deref()
            .map(str::parse::<usize>)
            .transpose()
            .map_err(|e| ArtifactError::Invalid(format!("num_feature: {e}")))?;

        let trees = learner
            .gradient_booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_document(i, t))
            .collect::<Result<Vec<_>, _>>()?;

        // Trained on an unnamed matrix
        let feature_names = Some(learner.feature_names).filter(|names| !names.is_empty());

        Ok(Self {
            feature_names,
            num_features,
            base_margin,
            trees,
        })
    }

    /// Raw score before the logistic link.
    pub fn margin(&self, row: &[f64]) -> Result<f64, ClassifierError> {
        self.trees
            .iter()
            .enumerate()
            .try_fold(self.base_margin, |acc, (i, tree)| -> Result<f64, ClassifierError> {
                Ok(acc + tree.leaf_value(i, row)?)
            })
    }

    fn expected_width(&self) -> Option<usize> {
        self.feature_names
            .as_ref()
            .map(Vec::len)
            .or(self.num_features)
    }
}

// XGBoost 2.x writes "5E-1"; 3.x writes "[5E-1]"
fn parse_base_score(raw: &str) -> Result<f64, ArtifactError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed
        .parse::<f64>()
        .map_err(|e| ArtifactError::Invalid(format!("base_score '{raw}': {e}")))
}

impl Classifier for BoostedTrees {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ClassifierError> {
        if let Some(expected) = self.expected_width() {
            if row.len() != expected {
                return Err(ClassifierError::RowWidth {
                    expected,
                    actual: row.len(),
                });
            }
        }

        let churn = sigmoid(self.margin(row)?);
        Ok([1.0 - churn, churn])
    }

    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoostedTrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    // Two stumps over [Contract_Monthly, tenure_group_1-12 mo, MonthlyCharges]
    fn model_json(feature_names: Value, base_score: &str) -> Value {
        json!({
            "learner": {
                "attributes": {},
                "feature_names": feature_names,
                "feature_types": ["int", "int", "float"],
                "gradient_booster": {
                    "model": {
                        "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                        "tree_info": [0, 0],
                        "trees": [
                            {
                                "id": 0,
                                "left_children": [1, -1, -1],
                                "right_children": [2, -1, -1],
                                "split_indices": [0, 0, 0],
                                "split_conditions": [0.5, -0.8, 0.9],
                                "default_left": [1, 0, 0],
                                "base_weights": [0.0, -0.8, 0.9]
                            },
                            {
                                "id": 1,
                                "left_children": [1, 3, -1, -1, -1],
                                "right_children": [2, 4, -1, -1, -1],
                                "split_indices": [1, 2, 0, 0, 0],
                                "split_conditions": [0.5, 80.0, 0.6, -0.3, 0.2],
                                "default_left": [false, true, false, false, false],
                                "base_weights": [0.0, 0.0, 0.6, -0.3, 0.2]
                            }
                        ]
                    },
                    "name": "gbtree"
                },
                "learner_model_param": {
                    "base_score": base_score,
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "3",
                    "num_target": "1"
                },
                "objective": {"name": "binary:logistic", "reg_loss_param": {"scale_pos_weight": "1"}}
            },
            "version": [2, 0, 3]
        })
    }

    fn named() -> Value {
        json!(["Contract_Monthly", "tenure_group_1-12 mo", "MonthlyCharges"])
    }

    #[test]
    fn test_margin_sums_leaves() {
        let model = BoostedTrees::from_json(model_json(named(), "5E-1")).unwrap();
        // Monthly, new customer: 0.9 + 0.6, base margin logit(0.5) = 0
        let margin = model.margin(&[1.0, 1.0, 70.0]).unwrap();
        assert!((margin - 1.5).abs() < 1e-6);

        // Two-year contract, long tenure, cheap plan: -0.8 - 0.3
        let margin = model.margin(&[0.0, 0.0, 50.0]).unwrap();
        assert!((margin + 1.1).abs() < 1e-6);

        // Expensive plan takes the right branch of the second tree
        let margin = model.margin(&[0.0, 0.0, 100.0]).unwrap();
        assert!((margin + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_probability_and_label() {
        let model = BoostedTrees::from_json(model_json(named(), "5E-1")).unwrap();
        let [stay, churn] = model.predict_proba(&[1.0, 1.0, 70.0]).unwrap();
        assert!((churn - sigmoid(1.5)).abs() < 1e-6);
        assert!((stay + churn - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[1.0, 1.0, 70.0]).unwrap(), 1);
        assert_eq!(model.predict(&[0.0, 0.0, 50.0]).unwrap(), 0);
    }

    #[test]
    fn test_base_score_shifts_margin() {
        let model = BoostedTrees::from_json(model_json(named(), "[2.5E-1]")).unwrap();
        let margin = model.margin(&[1.0, 1.0, 70.0]).unwrap();
        assert!((margin - (1.5 + (0.25f64 / 0.75).ln())).abs() < 1e-6);
    }

    #[test]
    fn test_missing_value_follows_default_direction() {
        let model = BoostedTrees::from_json(model_json(named(), "5E-1")).unwrap();
        // NaN goes left in tree 0 (-0.8); tree 1 sends tenure 1.0 right (0.6)
        let margin = model.margin(&[f64::NAN, 1.0, 70.0]).unwrap();
        assert!((margin + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unnamed_model_reports_no_schema() {
        let model = BoostedTrees::from_json(model_json(json!([]), "5E-1")).unwrap();
        assert!(model.feature_names().is_none());
        // Still evaluates against num_feature
        assert!(model.predict_proba(&[1.0, 1.0, 70.0]).is_ok());
        assert!(model.predict_proba(&[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let mut doc = model_json(named(), "5E-1");
        doc["learner"]["objective"]["name"] = json!("multi:softprob");
        let err = BoostedTrees::from_json(doc).unwrap_err();
        assert!(matches!(err, ArtifactError::Objective(ref o) if o == "multi:softprob"));
    }

    #[test]
    fn test_rejects_dangling_child() {
        let mut doc = model_json(named(), "5E-1");
        doc["learner"]["gradient_booster"]["model"]["trees"][0]["right_children"] = json!([7, -1, -1]);
        assert!(matches!(
            BoostedTrees::from_json(doc),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn test_split_compares_in_single_precision() {
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 70.3,
                    left: 1,
                    right: 2,
                    default_left: true,
                },
                Node::Leaf(-1.0),
                Node::Leaf(1.0),
            ],
        };
        // Below 70.3 in f64, but rounds to the f32 split value itself
        let charge = 70.2999995_f64;
        assert!(charge < 70.3_f64);
        assert_eq!(charge as f32, 70.3_f32);
        assert_eq!(tree.leaf_value(0, &[charge]).unwrap(), 1.0);

        assert_eq!(tree.leaf_value(0, &[70.29]).unwrap(), -1.0);
        assert_eq!(tree.leaf_value(0, &[70.3]).unwrap(), 1.0);
    }

    #[test]
    fn test_cycle_is_reported() {
        let tree = Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 0,
                default_left: true,
            }],
        };
        assert!(matches!(
            tree.leaf_value(0, &[1.0]),
            Err(ClassifierError::MalformedTree { .. })
        ));
    }
}
