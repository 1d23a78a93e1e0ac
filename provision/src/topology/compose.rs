use docker_compose_config::{
	Bind, ComposeFile, DependsOn, ListOrMap, LoggingDriver, LoggingSettings, Port, PortSettings,
	Restart, Service, ServiceVolume, ServiceVolumeSettings, StringOrList, StringOrNum,
	TopLevelNetwork, VolumeType,
};

use super::*;

impl From<RestartPolicy> for Restart {
	fn from(value: RestartPolicy) -> Self {
		match value {
			RestartPolicy::Never => Self::No,
			RestartPolicy::UnlessStopped => Self::UnlessStopped,
			RestartPolicy::Always => Self::Always,
		}
	}
}

impl From<&PortBinding> for Port {
	fn from(value: &PortBinding) -> Self {
		Self::Data(PortSettings {
			target: Some(StringOrNum::Num(value.container_port.into())),
			published: Some(StringOrNum::Num(value.host_port.into())),
			protocol: Some(value.protocol.clone()),
			..Default::default()
		})
	}
}

impl From<&VolumeBinding> for ServiceVolume {
	fn from(value: &VolumeBinding) -> Self {
		Self::Advanced(ServiceVolumeSettings {
			type_: VolumeType::Bind,
			read_only: value.read_only.then_some(true),
			// Relative to the compose file, which lives in the provisioning root
			source: Some(format!("./{}", value.host_path.display())),
			target: value.container_path.clone(),
			bind: Some(Bind {
				create_host_path: Some(value.kind == VolumeKind::Directory),
			}),
		})
	}
}

fn non_empty(list: &[String]) -> Option<StringOrList> {
	(!list.is_empty()).then(|| StringOrList::List(list.to_vec()))
}

impl ServiceSpec {
	/// Converts the service into a compose service attached to `network`.
	pub fn to_compose_service(&self, network: &str) -> Service {
		Service {
			image: Some(self.image.clone()),
			entrypoint: non_empty(&self.entrypoint),
			command: non_empty(&self.command),
			environment: (!self.env.is_empty()).then(|| ListOrMap::Map(self.env.clone())),
			user: self.user.clone(),
			ports: self.ports.iter().map(Port::from).collect(),
			volumes: self.volumes.iter().map(ServiceVolume::from).collect(),
			depends_on: (!self.depends_on.is_empty())
				.then(|| DependsOn::Simple(self.depends_on.clone())),
			networks: Some([network.to_string()].into()),
			restart: Some(self.restart_policy.into()),
			logging: Some(LoggingSettings {
				driver: Some(LoggingDriver::JsonFile),
				options: [
					("max-size".to_string(), StringOrNum::String("100m".to_string())),
					("max-file".to_string(), StringOrNum::String("3".to_string())),
				]
				.into(),
			}),
			..Default::default()
		}
	}
}

impl Topology {
	/// Renders the topology as a compose file.
	pub fn to_compose(&self) -> ComposeFile {
		ComposeFile {
			name: Some(self.project_name.clone()),
			services: self
				.services
				.iter()
				.map(|(name, service)| (name.clone(), service.to_compose_service(&self.network)))
				.collect(),
			networks: [(
				self.network.clone(),
				TopLevelNetwork {
					driver: Some("bridge".to_string()),
					..Default::default()
				},
			)]
			.into(),
			..Default::default()
		}
	}
}
