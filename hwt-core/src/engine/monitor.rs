//! Monitor engine
//!
//! [`Monitor`] is the single owner of the hardware provider, the settings
//! store, the sensor tree and the views derived from it (plot colors and the
//! overview list). Mutations only mark derived views dirty; they are
//! recomputed once per tick or on an explicit [`Monitor::refresh_derived`].

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::constants::limits;
use crate::data::{Color, HardwareEvent, SensorType, DEFAULT_PALETTE, MUTED_COLOR};
use crate::engine::colors::{assign_plot_colors, PlotColors};
use crate::engine::overview::{auto_name_candidates, auto_overview_candidates, select_overview};
use crate::error::{HwTreeError, Result};
use crate::hw::HardwareProvider;
use crate::identifier::Identifier;
use crate::settings::{MonitorConfig, SettingsStore};
use crate::system;
use crate::tree::{self, prefs, Node, NodeId, TreeModel};
use crate::virtual_sensors::{self as vs, VirtualSensor, VirtualSensorContainer};

/// What a tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Top-level units attached
    pub attached: usize,
    /// Top-level units removed
    pub removed: usize,
    pub plot_changed: bool,
    pub overview_changed: bool,
    /// Set on the tick that first saw hardware
    pub hardware_loaded: bool,
}

/// Which derived views changed on a refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedChanges {
    pub plot: bool,
    pub overview: bool,
}

pub struct Monitor<P: HardwareProvider, S: SettingsStore> {
    provider: P,
    settings: S,
    tree: TreeModel,
    config: MonitorConfig,
    palette: Vec<Color>,
    virtual_containers: BTreeMap<usize, VirtualSensorContainer>,
    plot_colors: PlotColors,
    overview: Vec<NodeId>,
    plot_dirty: bool,
    overview_dirty: bool,
    hardware_loaded: bool,
    first_start: bool,
}

impl<P: HardwareProvider, S: SettingsStore> Monitor<P, S> {
    /// Monitor rooted at this machine's host name
    pub fn new(provider: P, settings: S, config: MonitorConfig) -> Self {
        Self::with_host(provider, settings, config, &system::read_hostname())
    }

    pub fn with_host(provider: P, settings: S, config: MonitorConfig, host: &str) -> Self {
        let mut root = Node::root(Identifier::trusted([system::host_segment(host)]), host);
        prefs::apply_preferences(&mut root, &settings);
        debug!(root = %root.identifier, "Monitor created");

        Self {
            provider,
            settings,
            tree: TreeModel::new(root),
            config,
            palette: DEFAULT_PALETTE.to_vec(),
            virtual_containers: BTreeMap::new(),
            plot_colors: PlotColors::default(),
            overview: Vec::new(),
            plot_dirty: true,
            overview_dirty: true,
            hardware_loaded: false,
            first_start: false,
        }
    }

    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        self.palette = palette;
        self.plot_dirty = true;
        self
    }

    /// No settings existed before this run; the initial hardware load will
    /// put every fan and temperature sensor into the overview
    pub fn mark_first_start(&mut self) {
        self.first_start = true;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MonitorConfig {
        &mut self.config
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn plot_colors(&self) -> &PlotColors {
        &self.plot_colors
    }

    pub fn overview(&self) -> &[NodeId] {
        &self.overview
    }

    pub fn hardware_loaded(&self) -> bool {
        self.hardware_loaded
    }

    pub fn virtual_containers(&self) -> impl Iterator<Item = &VirtualSensorContainer> {
        self.virtual_containers.values()
    }

    /// Latest reading of a sensor node
    pub fn sensor_value(&self, id: NodeId) -> Option<f32> {
        let node = self.tree.get(id)?;
        if !node.is_sensor() {
            return None;
        }
        self.provider.sensor_value(&node.identifier)
    }

    /// Row color: muted when hidden, the plot color while plotting is on
    pub fn text_color(&self, id: NodeId) -> Option<Color> {
        let node = self.tree.get(id)?;
        if !node.visible {
            return Some(MUTED_COLOR);
        }
        if self.config.show_plot {
            return self.plot_colors.color(id);
        }
        None
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Rebuild persisted virtual containers; run once before ticking
    pub fn load_virtual_containers(&mut self) -> usize {
        let mut loaded = 0;
        for container in vs::load_virtual_containers(&self.settings) {
            if self.virtual_containers.contains_key(&container.index()) {
                continue;
            }
            self.install_container(container);
            loaded += 1;
        }
        loaded
    }

    fn install_container(&mut self, container: VirtualSensorContainer) {
        let descriptor = container.to_descriptor();
        self.provider.register_virtual(&descriptor);
        tree::on_hardware_attached(&mut self.tree, &self.settings, &descriptor);
        self.virtual_containers.insert(container.index(), container);
        self.mark_dirty();
    }

    /// Poll the provider, apply topology changes, recompute derived views
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for event in self.provider.update() {
            match event {
                HardwareEvent::Attached(descriptor) => {
                    if tree::on_hardware_attached(&mut self.tree, &self.settings, &descriptor) > 0 {
                        report.attached += 1;
                    }
                }
                HardwareEvent::Removed(identifier) => {
                    report.removed += tree::on_hardware_removed(&mut self.tree, &identifier);
                }
            }
        }
        if report.attached > 0 || report.removed > 0 {
            self.mark_dirty();
        }

        if !self.hardware_loaded && report.attached > 0 {
            self.hardware_loaded = true;
            report.hardware_loaded = true;
            if self.first_start {
                let flagged = self.auto_setup_overview();
                let named = self.auto_setup_names();
                info!(sensors = flagged, named, "First start, overview populated with fans and temperatures");
            }
            self.overview_dirty = true;
        }

        let changes = self.refresh_derived();
        report.plot_changed = changes.plot;
        report.overview_changed = changes.overview;
        report
    }

    /// Recompute whichever derived views are dirty
    pub fn refresh_derived(&mut self) -> DerivedChanges {
        let mut changes = DerivedChanges::default();
        if self.plot_dirty {
            let colors = assign_plot_colors(&self.tree, &self.palette);
            changes.plot = colors != self.plot_colors;
            self.plot_colors = colors;
            self.plot_dirty = false;
        }
        if self.overview_dirty {
            let overview = select_overview(&self.tree);
            changes.overview = overview != self.overview;
            self.overview = overview;
            self.overview_dirty = false;
        }
        changes
    }

    /// Flag every fan and temperature sensor for the overview
    pub fn auto_setup_overview(&mut self) -> usize {
        let candidates = auto_overview_candidates(&self.tree);
        for id in &candidates {
            if let Err(e) = self.set_overview(*id, true) {
                debug!("Skipping overview candidate: {}", e);
            }
        }
        self.first_start = false;
        candidates.len()
    }

    /// Name storage temperatures `HDD0`, `HDD1`, ... in tree order
    pub fn auto_setup_names(&mut self) -> usize {
        let candidates = auto_name_candidates(&self.tree);
        for (i, id) in candidates.iter().enumerate() {
            if let Err(e) = self.rename(*id, Some(&format!("HDD{i}"))) {
                debug!("Skipping name candidate: {}", e);
            }
        }
        candidates.len()
    }

    /// Persist the monitor configuration and flush settings to storage
    pub fn shutdown(&mut self) -> Result<()> {
        self.config.store(&mut self.settings);
        self.settings.flush()?;
        info!("Settings saved");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.plot_dirty = true;
        self.overview_dirty = true;
    }

    // ========================================================================
    // Node preferences
    // ========================================================================

    fn sensor_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        let node = self.tree.node_mut(id)?;
        if !node.is_sensor() {
            return Err(HwTreeError::NotSensor(node.identifier.to_string()));
        }
        Ok(node)
    }

    pub fn set_plot(&mut self, id: NodeId, plot: bool) -> Result<()> {
        let node = self.sensor_node_mut(id)?;
        let identifier = node.identifier.clone();
        if let Some(sensor) = node.as_sensor_mut() {
            if sensor.plot == plot {
                return Ok(());
            }
            sensor.plot = plot;
        }
        prefs::store_plot(&mut self.settings, &identifier, plot);
        self.plot_dirty = true;
        Ok(())
    }

    pub fn set_overview(&mut self, id: NodeId, overview: bool) -> Result<()> {
        let node = self.sensor_node_mut(id)?;
        let identifier = node.identifier.clone();
        if let Some(sensor) = node.as_sensor_mut() {
            if sensor.overview == overview {
                return Ok(());
            }
            sensor.overview = overview;
        }
        prefs::store_overview(&mut self.settings, &identifier, overview);
        self.overview_dirty = true;
        Ok(())
    }

    /// Set or clear (`None`) an explicit plot color
    pub fn set_pen_color(&mut self, id: NodeId, color: Option<Color>) -> Result<()> {
        let node = self.sensor_node_mut(id)?;
        let identifier = node.identifier.clone();
        if let Some(sensor) = node.as_sensor_mut() {
            sensor.pen_color = color;
        }
        prefs::store_pen_color(&mut self.settings, &identifier, color);
        self.plot_dirty = true;
        Ok(())
    }

    /// Give a sensor the palette color after the one it shows now
    pub fn cycle_pen_color(&mut self, id: NodeId) -> Result<Color> {
        if self.palette.is_empty() {
            return Err(HwTreeError::config("plot palette is empty"));
        }
        let node = self.tree.node(id)?;
        let current = node
            .as_sensor()
            .ok_or_else(|| HwTreeError::NotSensor(node.identifier.to_string()))?
            .pen_color
            .or_else(|| self.plot_colors.color(id));
        let next = match current.and_then(|c| self.palette.iter().position(|p| *p == c)) {
            Some(pos) => self.palette[(pos + 1) % self.palette.len()],
            None => self.palette[0],
        };
        self.set_pen_color(id, Some(next))?;
        Ok(next)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        node.visible = visible;
        let identifier = node.identifier.clone();
        prefs::store_visible(&mut self.settings, &identifier, visible);
        Ok(())
    }

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        node.collapsed = collapsed;
        let identifier = node.identifier.clone();
        prefs::store_collapsed(&mut self.settings, &identifier, collapsed);
        Ok(())
    }

    /// Rename a node; `None` or blank restores the provider's name
    pub fn rename(&mut self, id: NodeId, name: Option<&str>) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        node.text = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => node.default_text.clone(),
        };
        let identifier = node.identifier.clone();
        prefs::store_name(&mut self.settings, &identifier, name);
        Ok(())
    }

    // ========================================================================
    // Virtual sensors
    // ========================================================================

    /// Create a container at the lowest free index and return its node
    pub fn create_virtual_container(&mut self) -> Result<NodeId> {
        let capacity = HwTreeError::CapacityExceeded {
            max: limits::MAX_VIRTUAL_CONTAINERS,
        };
        if self.virtual_containers.len() >= limits::MAX_VIRTUAL_CONTAINERS {
            warn!(max = limits::MAX_VIRTUAL_CONTAINERS, "Virtual container limit reached");
            return Err(capacity);
        }
        let Some(index) = (0..limits::MAX_VIRTUAL_CONTAINERS).find(|i| {
            !self.virtual_containers.contains_key(i) && !self.settings.contains(&vs::sensor_index_key(*i))
        }) else {
            warn!("No free virtual container index left in settings");
            return Err(capacity);
        };

        vs::persist_container(&mut self.settings, index);
        let container = VirtualSensorContainer::new(index);
        let identifier = container.identifier().clone();
        self.install_container(container);
        info!(container = index, "Virtual container created");
        self.tree
            .lookup(&identifier)
            .ok_or_else(|| HwTreeError::node_not_found(identifier))
    }

    fn container_index(&self, id: NodeId) -> Result<usize> {
        let node = self.tree.node(id)?;
        node.virtual_index()
            .filter(|i| self.virtual_containers.contains_key(i))
            .ok_or_else(|| HwTreeError::NotVirtual(node.identifier.to_string()))
    }

    fn reregister(&mut self, index: usize) {
        if let Some(container) = self.virtual_containers.get(&index) {
            self.provider.register_virtual(&container.to_descriptor());
        }
    }

    /// Add a sensor of `sensor_type` to a container node and return the new node.
    ///
    /// Settings are only written once the node is in the tree.
    pub fn add_virtual_sensor(&mut self, container_id: NodeId, sensor_type: SensorType) -> Result<NodeId> {
        let index = self.container_index(container_id)?;
        let mut container = self
            .virtual_containers
            .get(&index)
            .cloned()
            .ok_or_else(|| HwTreeError::NotVirtual(vs::container_identifier(index).to_string()))?;

        let next_free = container.sensors().last().map_or(0, |s| s.index + 1);
        let sensor = VirtualSensor {
            index: vs::next_sensor_index(&self.settings, index).max(next_free),
            sensor_type,
        };
        container.add_sensor(sensor);
        let descriptor = container
            .to_descriptor()
            .sensors
            .into_iter()
            .find(|s| s.index == sensor.index)
            .ok_or_else(|| HwTreeError::node_not_found(container.sensor_identifier(sensor.index)))?;

        let mut node = Node::sensor(&descriptor);
        prefs::apply_preferences(&mut node, &self.settings);
        let id = self.tree.append_child(container_id, node)?;

        vs::persist_sensor(&mut self.settings, index, sensor);
        self.virtual_containers.insert(index, container);
        self.reregister(index);
        self.mark_dirty();
        info!(sensor = %descriptor.identifier, sensor_type = %sensor_type, "Virtual sensor added");
        Ok(id)
    }

    pub fn delete_virtual_sensor(&mut self, sensor_id: NodeId) -> Result<()> {
        let node = self.tree.node(sensor_id)?;
        let (container, slot) = vs::parse_sensor_identifier(&node.identifier)
            .filter(|(c, _)| node.is_sensor() && self.virtual_containers.contains_key(c))
            .ok_or_else(|| HwTreeError::NotVirtual(node.identifier.to_string()))?;
        let identifier = node.identifier.clone();

        self.tree.remove(sensor_id);
        if let Some(c) = self.virtual_containers.get_mut(&container) {
            c.remove_sensor(slot);
        }
        let purged = vs::purge_sensor(&mut self.settings, container, slot);
        self.reregister(container);
        self.mark_dirty();
        info!(sensor = %identifier, keys = purged, "Virtual sensor deleted");
        Ok(())
    }

    pub fn delete_virtual_container(&mut self, container_id: NodeId) -> Result<()> {
        let index = self.container_index(container_id)?;
        let identifier = vs::container_identifier(index);

        self.tree.remove(container_id);
        self.virtual_containers.remove(&index);
        self.provider.unregister_virtual(&identifier);
        let purged = vs::purge_container(&mut self.settings, index);
        self.mark_dirty();
        info!(container = index, keys = purged, "Virtual container deleted");
        Ok(())
    }

    /// Delete whichever virtual node `id` is: a container or one of its sensors
    pub fn delete_virtual(&mut self, id: NodeId) -> Result<()> {
        if self.tree.node(id)?.virtual_index().is_some() {
            self.delete_virtual_container(id)
        } else {
            self.delete_virtual_sensor(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HardwareCategory, HardwareDescriptor, SensorDescriptor};
    use crate::hw::{MockHardwareProvider, SimulatedProvider};
    use crate::settings::PersistentSettings;
    use std::collections::VecDeque;

    fn id(path: &str) -> Identifier {
        Identifier::parse(path).unwrap()
    }

    fn unit(path: &str, category: HardwareCategory, sensors: &[SensorType]) -> HardwareDescriptor {
        let identifier = id(path);
        HardwareDescriptor {
            sensors: sensors
                .iter()
                .enumerate()
                .map(|(i, t)| SensorDescriptor {
                    identifier: identifier.child(t.segment()).unwrap().child(i.to_string()).unwrap(),
                    name: format!("{t} #{i}"),
                    sensor_type: *t,
                    index: i,
                })
                .collect(),
            identifier,
            name: path.to_string(),
            category,
            sub_hardware: Vec::new(),
        }
    }

    /// Mock that replays one batch of events per update, then stays quiet
    fn scripted(batches: Vec<Vec<HardwareEvent>>) -> MockHardwareProvider {
        let mut batches: VecDeque<Vec<HardwareEvent>> = batches.into();
        let mut provider = MockHardwareProvider::new();
        provider
            .expect_update()
            .returning(move || batches.pop_front().unwrap_or_default());
        provider.expect_register_virtual().returning(|_| ());
        provider.expect_unregister_virtual().returning(|_| ());
        provider.expect_sensor_value().returning(|_| Some(42.0));
        provider
    }

    fn monitor(
        provider: MockHardwareProvider,
        settings: PersistentSettings,
    ) -> Monitor<MockHardwareProvider, PersistentSettings> {
        Monitor::with_host(provider, settings, MonitorConfig::default(), "testhost")
    }

    fn lookup<P: HardwareProvider, S: SettingsStore>(m: &Monitor<P, S>, path: &str) -> NodeId {
        m.tree().lookup(&id(path)).unwrap()
    }

    #[test]
    fn test_tick_applies_events() {
        let cpu = unit("/cpu/0", HardwareCategory::Cpu, &[SensorType::Temperature]);
        let mb = unit("/mainboard", HardwareCategory::Mainboard, &[]);
        let provider = scripted(vec![
            vec![HardwareEvent::Attached(cpu.clone()), HardwareEvent::Attached(mb)],
            vec![HardwareEvent::Attached(cpu), HardwareEvent::Removed(id("/gpu/0"))],
            vec![HardwareEvent::Removed(id("/cpu/0"))],
        ]);
        let mut m = monitor(provider, PersistentSettings::new());

        let first = m.tick();
        assert_eq!(first.attached, 2);
        assert!(first.hardware_loaded);
        assert!(m.tree().is_sorted());

        // duplicate attach and unknown removal are no-ops
        let second = m.tick();
        assert_eq!((second.attached, second.removed), (0, 0));
        assert!(!second.hardware_loaded);

        let third = m.tick();
        assert_eq!(third.removed, 1);
        assert!(m.tree().lookup(&id("/cpu/0")).is_none());
    }

    #[test]
    fn test_root_uses_host_name() {
        let m = monitor(scripted(vec![]), PersistentSettings::new());
        let root = m.tree().node(m.tree().root()).unwrap();
        assert_eq!(root.text, "testhost");
        assert_eq!(root.identifier.to_string(), "/testhost");
    }

    #[test]
    fn test_plot_toggle_marks_colors_dirty() {
        let cpu = unit("/cpu/0", HardwareCategory::Cpu, &[SensorType::Temperature, SensorType::Load]);
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(cpu)]]), PersistentSettings::new());
        m.tick();

        let temp = lookup(&m, "/cpu/0/temperature/0");
        m.set_plot(temp, true).unwrap();
        assert!(m.plot_colors().is_empty());

        let changes = m.refresh_derived();
        assert!(changes.plot);
        assert!(!changes.overview);
        assert_eq!(m.plot_colors().color(temp), Some(DEFAULT_PALETTE[0]));
        assert_eq!(m.text_color(temp), Some(DEFAULT_PALETTE[0]));
        assert_eq!(m.settings().get("/cpu/0/temperature/0/plot"), Some("true"));

        // nothing dirty, nothing changes
        assert_eq!(m.refresh_derived(), DerivedChanges::default());

        m.config_mut().show_plot = false;
        assert_eq!(m.text_color(temp), None);

        m.set_visible(temp, false).unwrap();
        assert_eq!(m.text_color(temp), Some(MUTED_COLOR));
    }

    #[test]
    fn test_set_plot_on_hardware_fails() {
        let cpu = unit("/cpu/0", HardwareCategory::Cpu, &[SensorType::Temperature]);
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(cpu)]]), PersistentSettings::new());
        m.tick();
        let hw = lookup(&m, "/cpu/0");
        assert!(matches!(m.set_plot(hw, true), Err(HwTreeError::NotSensor(_))));
        assert!(matches!(m.set_overview(hw, true), Err(HwTreeError::NotSensor(_))));
    }

    #[test]
    fn test_first_start_populates_overview() {
        let lpc = unit(
            "/lpc/0",
            HardwareCategory::SuperIo,
            &[SensorType::Voltage, SensorType::Fan, SensorType::Temperature],
        );
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(lpc)]]), PersistentSettings::new());
        m.mark_first_start();

        let report = m.tick();
        assert!(report.overview_changed);
        let names: Vec<String> = m
            .overview()
            .iter()
            .map(|n| m.tree().node(*n).unwrap().identifier.to_string())
            .collect();
        assert_eq!(names, vec!["/lpc/0/fan/1", "/lpc/0/temperature/2"]);
        assert_eq!(m.settings().get("/lpc/0/fan/1/overview"), Some("true"));
    }

    #[test]
    fn test_first_start_names_storage_temperatures() {
        let lpc = unit("/lpc/0", HardwareCategory::SuperIo, &[SensorType::Temperature]);
        let ssd = unit("/hdd/0", HardwareCategory::Storage, &[SensorType::Temperature, SensorType::Data]);
        let hdd = unit("/hdd/1", HardwareCategory::Storage, &[SensorType::Temperature]);
        let provider = scripted(vec![vec![
            HardwareEvent::Attached(ssd),
            HardwareEvent::Attached(lpc),
            HardwareEvent::Attached(hdd),
        ]]);
        let mut m = monitor(provider, PersistentSettings::new());
        m.mark_first_start();
        m.tick();

        let text = |path: &str| m.tree().node(lookup(&m, path)).unwrap().text.clone();
        assert_eq!(text("/hdd/0/temperature/0"), "HDD0");
        assert_eq!(text("/hdd/1/temperature/0"), "HDD1");
        assert_eq!(text("/lpc/0/temperature/0"), "Temperature #0");
        assert_eq!(m.settings().get("/hdd/1/temperature/0/name"), Some("HDD1"));
        assert!(!m.settings().contains("/hdd/0/data/1/name"));
    }

    #[test]
    fn test_restart_does_not_repopulate_overview() {
        let lpc = unit("/lpc/0", HardwareCategory::SuperIo, &[SensorType::Fan]);
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(lpc)]]), PersistentSettings::new());
        m.tick();
        assert!(m.overview().is_empty());
    }

    #[test]
    fn test_preferences_survive_reattach() {
        let gpu = unit("/gpu-amd/0", HardwareCategory::GpuAmd, &[SensorType::Temperature]);
        let provider = scripted(vec![
            vec![HardwareEvent::Attached(gpu.clone())],
            vec![HardwareEvent::Removed(gpu.identifier.clone())],
            vec![HardwareEvent::Attached(gpu)],
        ]);
        let mut m = monitor(provider, PersistentSettings::new());
        m.tick();
        let temp = lookup(&m, "/gpu-amd/0/temperature/0");
        m.set_plot(temp, true).unwrap();
        m.set_pen_color(temp, Some(Color::OLIVE)).unwrap();
        m.rename(temp, Some("Junction")).unwrap();

        m.tick();
        assert!(m.plot_colors().is_empty());
        m.tick();

        let temp = lookup(&m, "/gpu-amd/0/temperature/0");
        let node = m.tree().node(temp).unwrap();
        assert_eq!(node.text, "Junction");
        assert!(node.as_sensor().unwrap().plot);
        assert_eq!(m.plot_colors().color(temp), Some(Color::OLIVE));
    }

    #[test]
    fn test_cycle_pen_color() {
        let cpu = unit("/cpu/0", HardwareCategory::Cpu, &[SensorType::Temperature]);
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(cpu)]]), PersistentSettings::new());
        m.tick();
        let temp = lookup(&m, "/cpu/0/temperature/0");
        m.set_plot(temp, true).unwrap();
        m.refresh_derived();

        assert_eq!(m.cycle_pen_color(temp).unwrap(), DEFAULT_PALETTE[1]);
        assert_eq!(m.cycle_pen_color(temp).unwrap(), DEFAULT_PALETTE[2]);
        m.set_pen_color(temp, None).unwrap();
        assert!(!m.settings().contains("/cpu/0/temperature/0/penColor"));
    }

    #[test]
    fn test_load_virtual_containers_registers_and_attaches() {
        let settings: PersistentSettings = [
            ("/virtual/0/sensorindex", "2"),
            ("/virtual/0/0/sensortype", "4"),
            ("/virtual/0/1/sensortype", "1"),
            ("/virtual/3/sensorindex", "0"),
        ]
        .into_iter()
        .collect();

        let mut provider = MockHardwareProvider::new();
        provider
            .expect_register_virtual()
            .times(2)
            .returning(|_| ());
        let mut m = monitor(provider, settings);

        assert_eq!(m.load_virtual_containers(), 2);
        let container = lookup(&m, "/virtual/0");
        assert_eq!(m.tree().children(container).len(), 2);
        let types: Vec<SensorType> = m
            .tree()
            .children(container)
            .iter()
            .map(|c| m.tree().node(*c).unwrap().as_sensor().unwrap().sensor_type)
            .collect();
        assert_eq!(types, vec![SensorType::Fan, SensorType::Clock]);
        assert!(m.tree().lookup(&id("/virtual/3")).is_some());
    }

    #[test]
    fn test_virtual_sensor_lifecycle() {
        let mut m = monitor(scripted(vec![]), PersistentSettings::new());

        let container = m.create_virtual_container().unwrap();
        assert_eq!(m.tree().node(container).unwrap().virtual_index(), Some(0));
        assert_eq!(m.settings().get("/virtual/0/sensorindex"), Some("0"));

        let a = m.add_virtual_sensor(container, SensorType::Temperature).unwrap();
        let b = m.add_virtual_sensor(container, SensorType::Power).unwrap();
        assert_eq!(m.tree().node(b).unwrap().identifier.to_string(), "/virtual/0/1");
        assert_eq!(m.settings().get("/virtual/0/sensorindex"), Some("2"));
        assert_eq!(m.sensor_value(a), Some(42.0));

        m.set_plot(a, true).unwrap();
        m.delete_virtual_sensor(a).unwrap();
        assert!(!m.settings().contains("/virtual/0/0/sensortype"));
        assert!(!m.settings().contains("/virtual/0/0/plot"));
        assert_eq!(m.virtual_containers().next().unwrap().sensors().len(), 1);

        // slots are never reused
        let c = m.add_virtual_sensor(container, SensorType::Fan).unwrap();
        assert_eq!(m.tree().node(c).unwrap().identifier.to_string(), "/virtual/0/2");

        m.delete_virtual(container).unwrap();
        assert!(m.settings().is_empty());
        assert!(m.tree().is_empty());
        assert_eq!(m.virtual_containers().count(), 0);
    }

    #[test]
    fn test_virtual_sensor_past_large_counter_survives_restart() {
        let settings: PersistentSettings = [("/virtual/0/sensorindex", "1024")].into_iter().collect();
        let mut m = monitor(scripted(vec![]), settings);
        m.load_virtual_containers();
        let container = lookup(&m, "/virtual/0");

        let a = m.add_virtual_sensor(container, SensorType::Load).unwrap();
        let b = m.add_virtual_sensor(container, SensorType::Power).unwrap();
        assert_eq!(m.tree().node(a).unwrap().identifier.to_string(), "/virtual/0/1024");
        assert_eq!(m.tree().node(b).unwrap().identifier.to_string(), "/virtual/0/1025");
        assert_eq!(m.settings().get("/virtual/0/1024/sensortype"), Some("3"));

        let mut restarted = monitor(scripted(vec![]), m.settings().clone());
        restarted.load_virtual_containers();
        let container = lookup(&restarted, "/virtual/0");
        let children: Vec<String> = restarted
            .tree()
            .children(container)
            .iter()
            .map(|c| restarted.tree().node(*c).unwrap().identifier.to_string())
            .collect();
        assert_eq!(children, vec!["/virtual/0/1024", "/virtual/0/1025"]);
    }

    #[test]
    fn test_failed_virtual_sensor_add_leaves_settings_alone() {
        let mut m = monitor(scripted(vec![]), PersistentSettings::new());
        let container = m.create_virtual_container().unwrap();

        // a stray node already holds the slot the next add would take
        let stray = SensorDescriptor {
            identifier: id("/virtual/0/0"),
            name: "stray".to_string(),
            sensor_type: SensorType::Fan,
            index: 0,
        };
        m.tree.append_child(container, Node::sensor(&stray)).unwrap();
        let keys = m.settings().len();

        assert!(m.add_virtual_sensor(container, SensorType::Temperature).is_err());
        assert_eq!(m.settings().len(), keys);
        assert_eq!(m.settings().get("/virtual/0/sensorindex"), Some("0"));
        assert!(m.virtual_containers().next().unwrap().sensors().is_empty());
    }

    #[test]
    fn test_virtual_ops_reject_real_nodes() {
        let cpu = unit("/cpu/0", HardwareCategory::Cpu, &[SensorType::Temperature]);
        let mut m = monitor(scripted(vec![vec![HardwareEvent::Attached(cpu)]]), PersistentSettings::new());
        m.tick();
        let hw = lookup(&m, "/cpu/0");
        let temp = lookup(&m, "/cpu/0/temperature/0");

        assert!(matches!(m.add_virtual_sensor(hw, SensorType::Fan), Err(HwTreeError::NotVirtual(_))));
        assert!(matches!(m.delete_virtual(temp), Err(HwTreeError::NotVirtual(_))));
        assert!(matches!(m.delete_virtual_container(hw), Err(HwTreeError::NotVirtual(_))));

        m.tree.remove(temp);
        assert!(matches!(m.set_plot(temp, true), Err(HwTreeError::NodeNotFound(_))));
    }

    #[test]
    fn test_capacity_exceeded_leaves_state_unchanged() {
        let mut m = monitor(scripted(vec![]), PersistentSettings::new());
        for _ in 0..limits::MAX_VIRTUAL_CONTAINERS {
            m.create_virtual_container().unwrap();
        }
        let nodes = m.tree().len();
        let keys = m.settings().len();

        let err = m.create_virtual_container().unwrap_err();
        assert!(matches!(err, HwTreeError::CapacityExceeded { max: 32 }));
        assert_eq!(m.tree().len(), nodes);
        assert_eq!(m.settings().len(), keys);
        assert!(m.tree().is_sorted());
    }

    #[test]
    fn test_virtual_containers_sort_last() {
        let mut m = Monitor::with_host(
            SimulatedProvider::new(),
            PersistentSettings::new(),
            MonitorConfig::default(),
            "sim",
        );
        m.create_virtual_container().unwrap();
        m.tick();

        let root = m.tree().root();
        let last = *m.tree().children(root).last().unwrap();
        assert_eq!(m.tree().node(last).unwrap().category(), Some(HardwareCategory::Virtual));
        assert!(m.tree().is_sorted());
    }

    #[test]
    fn test_shutdown_stores_config() {
        let mut m = monitor(scripted(vec![]), PersistentSettings::new());
        m.config_mut().show_hidden = true;
        m.shutdown().unwrap();
        assert_eq!(m.settings().get("show_hidden"), Some("true"));
    }
}
