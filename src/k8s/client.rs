//! Kubernetes client builder with kubeconfig override support.

use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

use crate::config::KubeOptions;
use crate::error::VulnctlError;

/// Load the client configuration honouring `--kubeconfig`, `--context`,
/// `--cluster` and `--user`.
///
/// Without overrides, the configuration is inferred from the default
/// kubeconfig locations or the in-cluster service account.
pub async fn load_config(opts: &KubeOptions) -> Result<kube::Config, VulnctlError> {
    if !opts.has_overrides() {
        debug!("Inferring kubeconfig from environment");
        return kube::Config::infer()
            .await
            .map_err(|e| VulnctlError::Kubeconfig(e.to_string()));
    }

    let kubeconfig = match &opts.kubeconfig {
        Some(path) => {
            debug!("Reading kubeconfig from {}", path.display());
            Kubeconfig::read_from(path)
                .map_err(|e| VulnctlError::Kubeconfig(format!("{}: {}", path.display(), e)))?
        }
        None => Kubeconfig::read().map_err(|e| VulnctlError::Kubeconfig(e.to_string()))?,
    };

    let options = KubeConfigOptions {
        context: opts.context.clone(),
        cluster: opts.cluster.clone(),
        user: opts.user.clone(),
    };

    if let Some(ctx) = &options.context {
        debug!("Using kubeconfig context: {}", ctx);
    }

    kube::Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| match &options.context {
            Some(ctx) => VulnctlError::Kubeconfig(format!("context '{}': {}", ctx, e)),
            None => VulnctlError::Kubeconfig(e.to_string()),
        })
}

/// Namespace to query: the `--namespace` flag, else the namespace of the
/// selected context (kube falls back to `default`).
pub fn resolve_namespace(opts: &KubeOptions, config: &kube::Config) -> String {
    match &opts.namespace {
        Some(ns) => ns.clone(),
        None => config.default_namespace.clone(),
    }
}

/// Build a Kubernetes client from a loaded configuration.
pub fn build_client(config: kube::Config) -> Result<kube::Client, VulnctlError> {
    kube::Client::try_from(config).map_err(|e| VulnctlError::Client(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev-cluster
    cluster:
      server: https://127.0.0.1:6443
      insecure-skip-tls-verify: true
  - name: prod-cluster
    cluster:
      server: https://10.0.0.1:6443
      insecure-skip-tls-verify: true
users:
  - name: dev-user
    user:
      token: dev-token
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: dev-user
      namespace: staging
  - name: prod
    context:
      cluster: prod-cluster
      user: dev-user
"#;

    fn write_kubeconfig() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", KUBECONFIG).unwrap();
        file
    }

    fn opts_for(path: PathBuf) -> KubeOptions {
        KubeOptions {
            kubeconfig: Some(path),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_config_uses_current_context_namespace() {
        let file = write_kubeconfig();
        let opts = opts_for(file.path().to_path_buf());

        let config = load_config(&opts).await.unwrap();
        assert_eq!(config.default_namespace, "staging");
        assert_eq!(resolve_namespace(&opts, &config), "staging");
    }

    #[tokio::test]
    async fn test_load_config_context_override() {
        let file = write_kubeconfig();
        let opts = KubeOptions {
            context: Some("prod".to_string()),
            ..opts_for(file.path().to_path_buf())
        };

        let config = load_config(&opts).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("10.0.0.1"));
        // prod context has no namespace
        assert_eq!(resolve_namespace(&opts, &config), "default");
    }

    #[tokio::test]
    async fn test_namespace_flag_wins() {
        let file = write_kubeconfig();
        let opts = KubeOptions {
            namespace: Some("kube-system".to_string()),
            ..opts_for(file.path().to_path_buf())
        };

        let config = load_config(&opts).await.unwrap();
        assert_eq!(resolve_namespace(&opts, &config), "kube-system");
    }

    #[tokio::test]
    async fn test_load_config_unknown_context() {
        let file = write_kubeconfig();
        let opts = KubeOptions {
            context: Some("missing".to_string()),
            ..opts_for(file.path().to_path_buf())
        };

        let err = load_config(&opts).await.unwrap_err();
        assert!(err.to_string().starts_with("load kubeconfig: context 'missing'"));
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let opts = opts_for(PathBuf::from("/nonexistent/kubeconfig"));
        let err = load_config(&opts).await.unwrap_err();
        assert!(matches!(err, VulnctlError::Kubeconfig(_)));
        assert!(err.to_string().contains("/nonexistent/kubeconfig"));
    }

    #[tokio::test]
    async fn test_build_client_from_kubeconfig() {
        let file = write_kubeconfig();
        let config = load_config(&opts_for(file.path().to_path_buf()))
            .await
            .unwrap();
        let client = build_client(config).unwrap();
        assert_eq!(client.default_namespace(), "staging");
    }
}
