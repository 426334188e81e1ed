//! Scene graph resource traversal and full GPU teardown

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::lifecycle::resources::{GpuRelease, ReleaseGuard};

/// A releasable resource slot in the scene graph
type ResourceHandle = ReleaseGuard<Box<dyn GpuRelease>>;

/// One node of a scene graph: optional geometry, zero or more materials
/// (multi-material objects carry an array), and child nodes.
pub struct SceneNode {
    geometry: Option<ResourceHandle>,
    materials: Vec<ResourceHandle>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new() -> Self {
        Self {
            geometry: None,
            materials: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn set_geometry(&mut self, geometry: impl GpuRelease + 'static) {
        self.geometry = Some(ReleaseGuard::new(Box::new(geometry)));
    }

    pub fn push_material(&mut self, material: impl GpuRelease + 'static) {
        self.materials.push(ReleaseGuard::new(Box::new(material)));
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    fn release_recursive(&mut self) {
        if let Some(geometry) = self.geometry.as_mut() {
            geometry.release();
        }
        for material in &mut self.materials {
            material.release();
        }
        for child in &mut self.children {
            child.release_recursive();
        }
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Root container for a component's scene nodes. Owned by exactly one
/// visual component; never shared across instances.
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Release every geometry and material in the graph, then clear it.
    /// Individual failures are swallowed by the owning guards, so one bad
    /// resource never aborts cleanup of its siblings.
    pub fn release_all(&mut self) {
        for node in &mut self.nodes {
            node.release_recursive();
        }
        self.nodes.clear();
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// The renderer-side half of teardown: detaching the presentation surface
/// from its display parent and disposing the rendering context.
pub trait RendererHandle {
    fn detach_surface(&mut self);
    fn dispose(&mut self);
}

/// Full GPU teardown for one component: detach the render surface, release
/// the scene graph, dispose the renderer. Every step is individually
/// fault-tolerant; partial or duplicate teardown never throws and never
/// stops the remaining steps.
pub fn release_gpu(renderer: &mut dyn RendererHandle, scene: &mut SceneGraph) {
    if catch_unwind(AssertUnwindSafe(|| renderer.detach_surface())).is_err() {
        log::warn!("surface detach failed during teardown");
    }
    scene.release_all();
    if catch_unwind(AssertUnwindSafe(|| renderer.dispose())).is_err() {
        log::warn!("renderer dispose failed during teardown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::resources::tests::CountingResource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(releases: &Arc<AtomicUsize>) -> CountingResource {
        CountingResource {
            releases: Arc::clone(releases),
            panic_on_release: false,
        }
    }

    #[test]
    fn release_all_traverses_children_and_material_arrays() {
        let releases = Arc::new(AtomicUsize::new(0));

        let mut child = SceneNode::new();
        child.set_geometry(counting(&releases));
        child.push_material(counting(&releases));
        child.push_material(counting(&releases));

        let mut root = SceneNode::new();
        root.set_geometry(counting(&releases));
        root.push_material(counting(&releases));
        root.add_child(child);

        let mut graph = SceneGraph::new();
        graph.add_node(root);
        graph.release_all();

        assert_eq!(releases.load(Ordering::Relaxed), 5);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn failing_resource_does_not_abort_sibling_release() {
        let releases = Arc::new(AtomicUsize::new(0));

        let mut node = SceneNode::new();
        node.push_material(CountingResource {
            releases: Arc::clone(&releases),
            panic_on_release: true,
        });
        node.push_material(counting(&releases));
        node.push_material(counting(&releases));

        let mut graph = SceneGraph::new();
        graph.add_node(node);
        graph.release_all();

        assert_eq!(releases.load(Ordering::Relaxed), 2);
    }

    struct FlakyRenderer {
        detached: usize,
        disposed: usize,
        panic_on_detach: bool,
    }

    impl RendererHandle for FlakyRenderer {
        fn detach_surface(&mut self) {
            if self.panic_on_detach {
                panic!("surface already removed");
            }
            self.detached += 1;
        }
        fn dispose(&mut self) {
            self.disposed += 1;
        }
    }

    #[test]
    fn release_gpu_is_total_and_repeatable() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut node = SceneNode::new();
        node.set_geometry(counting(&releases));
        let mut graph = SceneGraph::new();
        graph.add_node(node);

        let mut renderer = FlakyRenderer {
            detached: 0,
            disposed: 0,
            panic_on_detach: false,
        };

        release_gpu(&mut renderer, &mut graph);
        // Second teardown of the same pair must be harmless
        release_gpu(&mut renderer, &mut graph);

        assert_eq!(releases.load(Ordering::Relaxed), 1);
        assert_eq!(renderer.disposed, 2);
    }

    #[test]
    fn detach_failure_still_releases_scene_and_renderer() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut node = SceneNode::new();
        node.set_geometry(counting(&releases));
        let mut graph = SceneGraph::new();
        graph.add_node(node);

        let mut renderer = FlakyRenderer {
            detached: 0,
            disposed: 0,
            panic_on_detach: true,
        };

        release_gpu(&mut renderer, &mut graph);
        assert_eq!(releases.load(Ordering::Relaxed), 1);
        assert_eq!(renderer.disposed, 1);
    }
}
