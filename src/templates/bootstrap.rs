//! Template document transforms.

use super::selector::SelectionError;
use serde_yaml::Value;

/// Path to the bootstrap script inside the VM template
const USER_DATA_PATH: [&str; 6] = [
    "resources",
    "compute_instance",
    "properties",
    "user_data",
    "str_replace",
    "template",
];

/// `-p <port>:<port>` for every port, space separated
pub fn publish_ports_arg(ports: &[u16]) -> String {
    ports
        .iter()
        .map(|port| format!(" -p {port}:{port}"))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Script that starts the container and reports success to the wait condition
pub fn registry_bootstrap_script(artifact: &str, ports: &[u16]) -> String {
    format!(
        "#!/bin/bash -x\n# Invoke the container\ndocker run {} -d {}\nwc_notify --data-binary '{{\"status\": \"SUCCESS\"}}'",
        publish_ports_arg(ports),
        artifact
    )
}

/// Replace the compute instance's bootstrap script and re-serialize the document
pub fn rewrite_bootstrap_script(template: &str, script: &str) -> Result<String, SelectionError> {
    let mut document: Value = serde_yaml::from_str(template)
        .map_err(|e| SelectionError::TemplateTransform(format!("invalid template: {e}")))?;

    let mut node = &mut document;
    for key in USER_DATA_PATH {
        node = node.get_mut(key).ok_or_else(|| {
            SelectionError::TemplateTransform(format!(
                "template has no {}",
                USER_DATA_PATH.join(".")
            ))
        })?;
    }
    *node = Value::String(script.to_string());

    serde_yaml::to_string(&document)
        .map_err(|e| SelectionError::TemplateTransform(format!("failed to serialize: {e}")))
}

/// Top-level `description` of a template document, if it has one
pub fn template_description(template: &str) -> Option<String> {
    let document: Value = serde_yaml::from_str(template).ok()?;
    document
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COREOS: &str = r#"
description: CoreOS host running a deployment unit
resources:
  compute_instance:
    type: OS::Nova::Server
    properties:
      flavor: { get_param: flavor }
      user_data:
        str_replace:
          template: |
            #!/bin/bash
            echo original
          params:
            $du: { get_param: du }
"#;

    #[test]
    fn test_publish_ports_arg() {
        assert_eq!(publish_ports_arg(&[80]), "-p 80:80");
        assert_eq!(publish_ports_arg(&[80, 443]), "-p 80:80 -p 443:443");
    }

    #[test]
    fn test_registry_script_layout() {
        let script = registry_bootstrap_script("registry.local/shop:1", &[8080]);
        assert_eq!(
            script,
            "#!/bin/bash -x\n# Invoke the container\ndocker run -p 8080:8080 -d registry.local/shop:1\nwc_notify --data-binary '{\"status\": \"SUCCESS\"}'"
        );
    }

    #[test]
    fn test_rewrite_replaces_only_the_script() {
        let script = registry_bootstrap_script("shop", &[80]);
        let rewritten = rewrite_bootstrap_script(COREOS, &script).unwrap();
        let document: Value = serde_yaml::from_str(&rewritten).unwrap();

        let user_data = &document["resources"]["compute_instance"]["properties"]["user_data"];
        assert_eq!(user_data["str_replace"]["template"].as_str(), Some(script.as_str()));
        assert!(user_data["str_replace"]["params"].get("$du").is_some());
        assert_eq!(
            document["description"].as_str(),
            Some("CoreOS host running a deployment unit")
        );
    }

    #[test]
    fn test_rewrite_requires_bootstrap_path() {
        let result = rewrite_bootstrap_script("description: flat\n", "echo");
        assert!(matches!(result, Err(SelectionError::TemplateTransform(_))));
    }

    #[test]
    fn test_template_description() {
        assert_eq!(
            template_description(COREOS).as_deref(),
            Some("CoreOS host running a deployment unit")
        );
        assert_eq!(template_description("resources: {}\n"), None);
    }
}
