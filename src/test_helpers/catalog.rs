use crate::constants::catalog::{
    CONTAINER_TEMPLATE, CONTRIB_CATEGORY, DU_HANDLING_SCRIPT, TEMPLATES_CATEGORY, VM_TEMPLATE,
};
use crate::templates::{CatalogError, TemplateCatalog};
use parking_lot::Mutex;
use std::collections::HashMap;

pub const BASIC_TEMPLATE: &str = r#"description: Basic app container
parameters:
  app_name: { type: string }
  image: { type: string }
  port: { type: number }
resources:
  compute_instance:
    type: OS::Nova::Server
    properties:
      image: { get_param: image }
outputs:
  public_ip:
    value: { get_attr: [compute_instance, first_address] }
"#;

pub const COREOS_TEMPLATE: &str = r#"description: CoreOS host running a deployment unit
parameters:
  name: { type: string }
  flavor: { type: string }
  image: { type: string }
  location: { type: string }
  du: { type: string }
  publish_ports: { type: string }
resources:
  compute_instance:
    type: OS::Nova::Server
    properties:
      flavor: { get_param: flavor }
      image: { get_param: image }
      user_data:
        str_replace:
          template: |
            #!/bin/bash -x
            wget $location -O /tmp/du.tar && docker load < /tmp/du.tar
            docker run $publish_ports -d $du
          params:
            $location: { get_param: location }
            $du: { get_param: du }
            $publish_ports: { get_param: publish_ports }
"#;

pub const DU_SCRIPT: &str = "#!/bin/bash\n# retry deployment unit download\n";

/// Catalog held in memory, seeded with the stock templates
#[derive(Debug)]
pub struct InMemoryTemplateCatalog {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl Default for InMemoryTemplateCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTemplateCatalog {
    pub fn new() -> Self {
        let catalog = Self::empty();
        catalog.insert(TEMPLATES_CATEGORY, CONTAINER_TEMPLATE, BASIC_TEMPLATE);
        catalog.insert(TEMPLATES_CATEGORY, VM_TEMPLATE, COREOS_TEMPLATE);
        catalog.insert(CONTRIB_CATEGORY, DU_HANDLING_SCRIPT, DU_SCRIPT);
        catalog
    }

    pub fn empty() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, category: &str, name: &str, body: &str) {
        self.entries
            .lock()
            .insert((category.to_string(), name.to_string()), body.to_string());
    }

    pub fn remove(&self, category: &str, name: &str) {
        self.entries
            .lock()
            .remove(&(category.to_string(), name.to_string()));
    }
}

impl TemplateCatalog for InMemoryTemplateCatalog {
    fn get(&self, category: &str, name: &str) -> Result<String, CatalogError> {
        self.entries
            .lock()
            .get(&(category.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    fn get_from_contrib(&self, name: &str) -> Result<String, CatalogError> {
        self.get(CONTRIB_CATEGORY, name)
    }
}
