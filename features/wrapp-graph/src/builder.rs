use std::collections::{HashMap, HashSet};

use crate::{
    component::{ComponentDescriptor, ComponentId, ComponentTree},
    declaration::{ComponentDecl, Declaration, DeclarationKind, ModuleDecl},
    errors::InputError,
    key::Key,
    request::DependencyRequest,
    store::DeclarationStore,
    types::TypeName,
};

/// Collects the output of the front end: modules, components and the flat declaration list.
///
/// Building the store resolves every reference between them,
/// afterwards the store is immutable and can back any number of resolutions.
#[derive(Debug, Default)]
pub struct DeclarationsBuilder {
    modules: Vec<ModuleDecl>,
    components: Vec<ComponentDecl>,
    declarations: Vec<Declaration>,
}

impl DeclarationsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(mut self, module: ModuleDecl) -> Self {
        self.modules.push(module);
        self
    }

    pub fn add_component(mut self, component: ComponentDecl) -> Self {
        self.components.push(component);
        self
    }

    pub fn add_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn add_declarations(mut self, declarations: impl IntoIterator<Item = Declaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    pub fn build(self) -> Result<DeclarationStore, InputError> {
        let DeclarationsBuilder {
            modules,
            components,
            mut declarations,
        } = self;

        tracing::debug!(
            "Building declaration store from {} modules, {} components and {} declarations",
            modules.len(),
            components.len(),
            declarations.len()
        );

        let module_order = modules
            .iter()
            .map(|module| module.name.clone())
            .collect::<Vec<_>>();
        let modules = index_modules(modules)?;
        let components = order_parents_first(components)?;
        let ids: HashMap<TypeName, ComponentId> = components
            .iter()
            .enumerate()
            .map(|(idx, component)| (component.name.clone(), ComponentId(idx)))
            .collect();

        for declaration in &declarations {
            check_declaration(declaration, &modules)?;
        }

        // Modules per component, without those an ancestor already installs
        let mut visible_modules: Vec<HashSet<TypeName>> = Vec::with_capacity(components.len());
        let mut descriptors = Vec::with_capacity(components.len());
        for (idx, component) in components.iter().enumerate() {
            let parent = component.parent.as_ref().map(|parent| ids[parent]);
            let inherited = parent
                .map(|parent| visible_modules[parent.0].clone())
                .unwrap_or_default();

            let mut installed = Vec::new();
            for module in &component.modules {
                collect_module(
                    module,
                    component.name.as_str(),
                    &modules,
                    &inherited,
                    &mut installed,
                )?;
            }

            let mut visible = inherited;
            visible.extend(installed.iter().cloned());
            visible_modules.push(visible);

            descriptors.push(ComponentDescriptor {
                id: ComponentId(idx),
                name: component.name.clone(),
                parent,
                children: Vec::new(),
                modules: installed,
                entry_points: component.entry_points.clone(),
                scopes: component.scopes.clone(),
                creator: component.creator.clone(),
                production: component.production,
                incomplete: component.incomplete,
            });
        }

        for idx in 0..descriptors.len() {
            if let Some(parent) = descriptors[idx].parent {
                descriptors[parent.0].children.push(ComponentId(idx));
            }
        }

        // A creator binding is installed where the listing module is
        for descriptor in &descriptors {
            for module in &descriptor.modules {
                for subcomponent in &modules[module].subcomponents {
                    let is_child = ids
                        .get(subcomponent)
                        .is_some_and(|child| descriptors[child.0].parent == Some(descriptor.id));
                    if ids.contains_key(subcomponent) && !is_child {
                        return Err(InputError::SubcomponentNotAChild {
                            module: module.clone(),
                            subcomponent: subcomponent.clone(),
                            component: descriptor.name.clone(),
                        });
                    }
                }
            }
        }

        // Bindings owned by components rather than modules
        let mut synthesized: Vec<(ComponentId, Declaration)> = Vec::new();
        let mut listed_subcomponents = HashSet::new();
        for module in module_order.iter().map(|name| &modules[name]) {
            for subcomponent in &module.subcomponents {
                let Some(child) = ids.get(subcomponent) else {
                    return Err(InputError::UnknownSubcomponent {
                        module: module.name.clone(),
                        subcomponent: subcomponent.clone(),
                    });
                };
                let Some(creator) = &components[child.0].creator else {
                    return Err(InputError::SubcomponentWithoutCreator {
                        module: module.name.clone(),
                        subcomponent: subcomponent.clone(),
                    });
                };
                listed_subcomponents.insert(subcomponent.clone());
                declarations.push(Declaration::subcomponent_creator(
                    Some(module.name.clone()),
                    creator,
                    subcomponent,
                ));
            }
        }

        for (idx, component) in components.iter().enumerate() {
            let id = ComponentId(idx);
            synthesized.push((id, Declaration::component_instance(&component.name)));

            for dependency in &component.dependencies {
                let instance = Key::of(dependency.ty.clone());
                synthesized.push((
                    id,
                    Declaration::component_dependency(instance.clone(), dependency.ty.as_str()),
                ));
                // Provision methods are called on the dependency instance
                for key in &dependency.provisions {
                    synthesized.push((
                        id,
                        Declaration::component_dependency(
                            key.clone(),
                            format!("{}#{}", dependency.ty, key),
                        )
                        .depends_on(DependencyRequest::instance(instance.clone())),
                    ));
                }
            }

            for key in &component.bound_instances {
                synthesized.push((
                    id,
                    Declaration::bound_instance(
                        key.clone(),
                        format!("{} bound instance {}", component.name, key),
                    ),
                ));
            }

            if let (Some(parent), Some(creator)) = (&component.parent, &component.creator) {
                if !listed_subcomponents.contains(&component.name) {
                    synthesized.push((
                        ids[parent],
                        Declaration::subcomponent_creator(None, creator, &component.name),
                    ));
                }
            }
        }

        Ok(DeclarationStore::new(
            declarations,
            synthesized,
            ComponentTree::new(descriptors),
        ))
    }
}

fn index_modules(modules: Vec<ModuleDecl>) -> Result<HashMap<TypeName, ModuleDecl>, InputError> {
    let mut indexed = HashMap::with_capacity(modules.len());
    for module in modules {
        if indexed.contains_key(&module.name) {
            return Err(InputError::DuplicateModule(module.name));
        }
        indexed.insert(module.name.clone(), module);
    }
    Ok(indexed)
}

/// Orders components so every parent precedes its children, otherwise keeping declaration order
fn order_parents_first(components: Vec<ComponentDecl>) -> Result<Vec<ComponentDecl>, InputError> {
    let mut names = HashSet::with_capacity(components.len());
    for component in &components {
        if !names.insert(component.name.clone()) {
            return Err(InputError::DuplicateComponent(component.name.clone()));
        }
    }
    for component in &components {
        if let Some(parent) = &component.parent {
            if !names.contains(parent) {
                return Err(InputError::UnknownParent {
                    component: component.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let mut placed = HashSet::with_capacity(components.len());
    let mut ordered = Vec::with_capacity(components.len());
    let mut pending = components;
    while !pending.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = pending.into_iter().partition(|component| {
            component
                .parent
                .as_ref()
                .is_none_or(|parent| placed.contains(parent))
        });

        if ready.is_empty() {
            return Err(InputError::ParentCycle(blocked[0].name.clone()));
        }

        placed.extend(ready.iter().map(|component| component.name.clone()));
        ordered.extend(ready);
        pending = blocked;
    }

    Ok(ordered)
}

fn check_declaration(
    declaration: &Declaration,
    modules: &HashMap<TypeName, ModuleDecl>,
) -> Result<(), InputError> {
    if let Some(module) = &declaration.module {
        if !modules.contains_key(module) {
            return Err(InputError::UnknownModule {
                module: module.clone(),
                referenced_by: declaration.element.to_string(),
            });
        }
    }

    let single_dependency = matches!(
        declaration.kind,
        DeclarationKind::Delegate | DeclarationKind::OptionalOf
    );
    if single_dependency && declaration.dependencies.len() != 1 {
        return Err(InputError::InvalidDependencyCount {
            element: declaration.to_string(),
            actual: declaration.dependencies.len(),
        });
    }

    Ok(())
}

/// Adds `module` and everything it includes, depth first in declaration order
fn collect_module(
    module: &TypeName,
    referenced_by: &str,
    modules: &HashMap<TypeName, ModuleDecl>,
    inherited: &HashSet<TypeName>,
    installed: &mut Vec<TypeName>,
) -> Result<(), InputError> {
    let Some(declared) = modules.get(module) else {
        return Err(InputError::UnknownModule {
            module: module.clone(),
            referenced_by: referenced_by.to_string(),
        });
    };

    if inherited.contains(module) || installed.contains(module) {
        return Ok(());
    }
    installed.push(module.clone());

    for included in &declared.includes {
        collect_module(included, module.as_str(), modules, inherited, installed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn orders_children_after_parents() {
        let store = DeclarationsBuilder::new()
            .add_component(ComponentDecl::new("Child").child_of("Root"))
            .add_component(ComponentDecl::new("Root"))
            .build()
            .unwrap();

        let tree = store.tree();
        let root = tree.find(&TypeName::new("Root")).unwrap();
        let child = tree.find(&TypeName::new("Child")).unwrap();
        assert_eq!(root, ComponentId(0));
        assert_eq!(tree.get(child).parent, Some(root));
        assert_eq!(tree.get(root).children, vec![child]);
    }

    #[test]
    fn rejects_parent_cycles() {
        let error = DeclarationsBuilder::new()
            .add_component(ComponentDecl::new("A").child_of("B"))
            .add_component(ComponentDecl::new("B").child_of("A"))
            .build()
            .unwrap_err();

        assert_eq!(error, InputError::ParentCycle(TypeName::new("A")));
    }

    #[test]
    fn rejects_unknown_modules() {
        let error = DeclarationsBuilder::new()
            .add_component(ComponentDecl::new("Root").install("Missing"))
            .build()
            .unwrap_err();

        assert_eq!(
            error,
            InputError::UnknownModule {
                module: TypeName::new("Missing"),
                referenced_by: "Root".to_string(),
            }
        );
    }

    #[test]
    fn rejects_delegates_without_a_target() {
        let mut delegate = Declaration::delegate(
            "PumpModule",
            "bindPump()",
            Key::of("Pump"),
            DependencyRequest::instance(Key::of("Thermosiphon")),
        );
        delegate.dependencies.clear();

        let error = DeclarationsBuilder::new()
            .add_module(ModuleDecl::new("PumpModule"))
            .add_declaration(delegate)
            .build()
            .unwrap_err();

        assert_eq!(
            error,
            InputError::InvalidDependencyCount {
                element: "PumpModule.bindPump()".to_string(),
                actual: 0,
            }
        );
    }

    #[test]
    fn modules_of_ancestors_are_not_installed_again() {
        let store = DeclarationsBuilder::new()
            .add_module(ModuleDecl::new("Shared"))
            .add_module(ModuleDecl::new("ChildModule").includes("Shared"))
            .add_component(ComponentDecl::new("Root").install("Shared"))
            .add_component(
                ComponentDecl::new("Child")
                    .child_of("Root")
                    .install("ChildModule"),
            )
            .build()
            .unwrap();

        let tree = store.tree();
        let child = tree.find(&TypeName::new("Child")).unwrap();
        assert_eq!(tree.get(child).modules, vec![TypeName::new("ChildModule")]);
    }
}
