// crates/engine_core/src/engine.rs
//! Module bring-up and teardown in dependency order.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{self, DeviceState, InputSystem};
use crate::resource::{self, ResourceManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleId {
    Config,
    Event,
    Resource,
    Input,
}

impl ModuleId {
    pub const ALL: [ModuleId; 4] = [
        ModuleId::Config,
        ModuleId::Event,
        ModuleId::Resource,
        ModuleId::Input,
    ];

    /// Modules that must be up before this one.
    pub fn dependencies(self) -> &'static [ModuleId] {
        match self {
            ModuleId::Config | ModuleId::Event => &[],
            ModuleId::Resource => resource::setup(),
            ModuleId::Input => input::setup(),
        }
    }
}

/// Every module, each one after its dependencies.
pub fn init_order() -> Vec<ModuleId> {
    fn visit(module: ModuleId, order: &mut Vec<ModuleId>) {
        if order.contains(&module) {
            return;
        }
        for dependency in module.dependencies() {
            visit(*dependency, order);
        }
        order.push(module);
    }

    let mut order = Vec::with_capacity(ModuleId::ALL.len());
    for module in ModuleId::ALL {
        visit(module, &mut order);
    }
    order
}

pub struct Engine {
    resources: ResourceManager,
    input: InputSystem,
}

impl Engine {
    pub fn init(config: EngineConfig) -> Result<Self, EngineError> {
        let mut resources = None;
        let mut input = None;

        for module in init_order() {
            debug!(?module, "init");
            match module {
                // Plain data and per-module buses: nothing to start.
                ModuleId::Config | ModuleId::Event => {}
                ModuleId::Resource => {
                    resources = Some(ResourceManager::init(config.resource.clone())?)
                }
                ModuleId::Input => input = Some(InputSystem::init(&config.input)?),
            }
        }

        let resources = resources.ok_or(EngineError::NotStarted(ModuleId::Resource))?;
        let input = input.ok_or(EngineError::NotStarted(ModuleId::Input))?;
        info!("engine modules initialized");
        Ok(Self { resources, input })
    }

    /// One frame: resource completions and watches, then inputs.
    pub fn update(&mut self, device: &dyn DeviceState) {
        self.resources.update();
        self.input.update(device);
    }

    pub fn exit(self) {
        let Self { resources, input } = self;
        let mut input = Some(input);
        let mut resources = Some(resources);

        for module in init_order().into_iter().rev() {
            debug!(?module, "exit");
            match module {
                ModuleId::Input => {
                    if let Some(input) = input.take() {
                        input.exit();
                    }
                }
                ModuleId::Resource => {
                    if let Some(resources) = resources.take() {
                        resources.exit();
                    }
                }
                ModuleId::Config | ModuleId::Event => {}
            }
        }
        info!("engine modules shut down");
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn input(&self) -> &InputSystem {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputSystem {
        &mut self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DeviceSnapshot;
    use engine_shared::input_types::KeyboardKey;

    #[test]
    fn dependencies_come_first() {
        let order = init_order();
        let position = |m| order.iter().position(|x| *x == m).unwrap();

        assert_eq!(order.len(), ModuleId::ALL.len());
        assert!(position(ModuleId::Resource) < position(ModuleId::Input));
        assert!(position(ModuleId::Config) < position(ModuleId::Resource));
        assert!(position(ModuleId::Event) < position(ModuleId::Input));
    }

    #[test]
    fn engine_updates_inputs() {
        let config = EngineConfig::from_toml_str(
            r#"
[input]
set_list = ["Game"]

[input.sets.Game.inputs]
Jump = ["KEY_SPACE"]
"#,
        )
        .unwrap();

        let mut engine = Engine::init(config).unwrap();
        let mut device = DeviceSnapshot::new();
        device.set_key(KeyboardKey::Space, true);
        engine.update(&device);

        assert!(engine.input().is_active("Jump"));
        assert_eq!(engine.resources().type_counter(), 1);
        engine.exit();
    }
}
