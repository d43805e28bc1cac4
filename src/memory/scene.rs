use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::Category;
use crate::error::{ConfigError, Result};
use crate::geometry::Plane;
use crate::kernel::{MakeBox, MakePrism, Polyhedron};
use crate::math::{Matrix4, Point3, Vector3};
use crate::port::GeometryNode;

use super::{ElementData, LinkId, MemoryModel, ViewData, ViewId};

fn default_segments() -> usize {
    16
}

/// A model described in JSON, loaded into a [`MemoryModel`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub views: Vec<SceneView>,
    pub links: Vec<SceneLink>,
    /// Name of the active view.
    pub active_view: Option<String>,
    pub elements: Vec<SceneElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneView {
    pub name: String,
    /// Sketch plane. Omitted for 3D views.
    #[serde(default)]
    pub plane: Option<ScenePlane>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
}

/// A linked model placed by a translation and a rotation about Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLink {
    pub name: String,
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rotation_z_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub system_type: Option<String>,
    #[serde(default)]
    pub diameter: Option<f64>,
    /// Name of the link the element belongs to.
    #[serde(default)]
    pub link: Option<String>,
    /// Names of the views showing the element. Omitted means all.
    #[serde(default)]
    pub visible_in: Option<Vec<String>>,
    pub geometry: Vec<SceneGeometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneGeometry {
    Box {
        min: [f64; 3],
        max: [f64; 3],
    },
    /// A round run approximated by a regular prism.
    Pipe {
        start: [f64; 3],
        end: [f64; 3],
        radius: f64,
        #[serde(default = "default_segments")]
        segments: usize,
    },
    Instance {
        #[serde(default)]
        translation: [f64; 3],
        #[serde(default)]
        rotation_z_degrees: f64,
        children: Vec<SceneGeometry>,
    },
}

fn point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

fn placement(translation: [f64; 3], rotation_z_degrees: f64) -> Matrix4 {
    Matrix4::new_translation(&Vector3::from(translation))
        * Matrix4::new_rotation(Vector3::z() * rotation_z_degrees.to_radians())
}

impl SceneGeometry {
    fn build(&self) -> Result<GeometryNode<Polyhedron>> {
        Ok(match self {
            Self::Box { min, max } => GeometryNode::Solid(MakeBox::new(point(*min), point(*max)).execute()?),
            Self::Pipe {
                start,
                end,
                radius,
                segments,
            } => GeometryNode::Solid(MakePrism::regular(point(*start), point(*end), *radius, *segments)?.execute()?),
            Self::Instance {
                translation,
                rotation_z_degrees,
                children,
            } => GeometryNode::Instance {
                transform: placement(*translation, *rotation_z_degrees),
                children: children.iter().map(Self::build).collect::<Result<_>>()?,
            },
        })
    }
}

impl Scene {
    /// Parses a scene from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the text is not a valid scene.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text).map_err(ConfigError::from)?)
    }

    /// Reads and parses a scene file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `ConfigError::Json` if it is not a valid scene.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Builds a model from the scene.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for references to unknown views or
    /// links, and a geometry error for degenerate shapes.
    pub fn build(&self) -> Result<MemoryModel> {
        let mut model = MemoryModel::new();

        let mut views: HashMap<&str, ViewId> = HashMap::new();
        for view in &self.views {
            let plane = view
                .plane
                .as_ref()
                .map(|p| Plane::from_normal(point(p.origin), Vector3::from(p.normal)))
                .transpose()?;
            views.insert(view.name.as_str(), model.add_view(ViewData::new(view.name.clone(), plane)));
        }

        let mut links: HashMap<&str, LinkId> = HashMap::new();
        for link in &self.links {
            let transform = placement(link.translation, link.rotation_z_degrees);
            links.insert(link.name.as_str(), model.add_link(link.name.clone(), transform));
        }

        if let Some(name) = &self.active_view {
            let view = lookup(&views, name, "view")?;
            model.set_active_view(view);
        }

        for element in &self.elements {
            let mut data = ElementData::new(element.name.clone(), element.category);
            data.system_type.clone_from(&element.system_type);
            data.diameter = element.diameter;
            if let Some(link) = &element.link {
                data.link = Some(lookup(&links, link, "link")?);
            }
            if let Some(names) = &element.visible_in {
                let ids = names
                    .iter()
                    .map(|n| lookup(&views, n, "view"))
                    .collect::<Result<_>>()?;
                data.visible_in = Some(ids);
            }
            data.geometry = element
                .geometry
                .iter()
                .map(SceneGeometry::build)
                .collect::<Result<_>>()?;
            model.add_element(data);
        }

        debug!(
            views = self.views.len(),
            links = self.links.len(),
            elements = self.elements.len(),
            "scene built"
        );
        Ok(model)
    }
}

fn lookup<K: Copy>(table: &HashMap<&str, K>, name: &str, what: &str) -> Result<K> {
    table
        .get(name)
        .copied()
        .ok_or_else(|| ConfigError::Invalid(format!("unknown {what} '{name}'")).into())
}
