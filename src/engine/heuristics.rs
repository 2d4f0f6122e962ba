//! Rule sets behind the network, system and server recommendations.
//!
//! Each rule set has a `Default` holding the built-in heuristic values. A trained
//! model artifact carries the same shapes with tuned values, so the fallback path and
//! the model-backed path run through identical code.

use serde::{Deserialize, Serialize};

use super::errors::EngineError;
use super::types::{
    HardwareTier, NetworkData, NetworkRecommendation, Provenance, ServerData, ServerRecommendation,
    SystemData, SystemRecommendation,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkRules {
    pub ping_threshold: f64,
    pub jitter_threshold: f64,
    pub packet_loss_threshold: f64,
    /// Above this jitter a degraded link is switched to TCP
    pub tcp_jitter_threshold: f64,
    pub degraded_dns: String,
    pub default_dns: String,
    pub degraded_priority: String,
    pub default_priority: String,
}

impl Default for NetworkRules {
    fn default() -> Self {
        Self {
            ping_threshold: 100.0,
            jitter_threshold: 20.0,
            packet_loss_threshold: 2.0,
            tcp_jitter_threshold: 10.0,
            degraded_dns: "Cloudflare DNS (1.1.1.1, 1.0.0.1)".to_string(),
            default_dns: "Default DNS".to_string(),
            degraded_priority: "gaming".to_string(),
            default_priority: "balanced".to_string(),
        }
    }
}

impl NetworkRules {
    pub fn recommend(&self, data: &NetworkData, provenance: Provenance) -> NetworkRecommendation {
        let degraded = data.ping > self.ping_threshold
            || data.jitter > self.jitter_threshold
            || data.packet_loss > self.packet_loss_threshold;

        if degraded {
            NetworkRecommendation {
                dns_settings: self.degraded_dns.clone(),
                protocol: if data.jitter > self.tcp_jitter_threshold { "TCP" } else { "UDP" }.to_string(),
                qos_enabled: true,
                qos_priority: self.degraded_priority.clone(),
                provenance,
            }
        } else {
            NetworkRecommendation {
                dns_settings: self.default_dns.clone(),
                protocol: "Auto".to_string(),
                qos_enabled: false,
                qos_priority: self.default_priority.clone(),
                provenance,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemRules {
    pub high_end_cpu: Vec<String>,
    pub high_end_gpu: Vec<String>,
    pub mid_range_cpu: Vec<String>,
    pub mid_range_gpu: Vec<String>,
    /// High-end rigs below this fps get a cooling check
    pub high_end_fps_floor: f64,
    /// Mid-range rigs below this fps keep vsync on
    pub mid_range_vsync_fps: f64,
    pub bottleneck_usage: f64,
    /// Low-end rigs above this fps stay at 1080p
    pub low_end_fps_floor: f64,
}

impl Default for SystemRules {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            high_end_cpu: words(&["i9", "ryzen 9"]),
            high_end_gpu: words(&["rtx 30", "rtx 40"]),
            mid_range_cpu: words(&["i7", "ryzen 7"]),
            mid_range_gpu: words(&["rtx 20", "gtx 16"]),
            high_end_fps_floor: 100.0,
            mid_range_vsync_fps: 100.0,
            bottleneck_usage: 90.0,
            low_end_fps_floor: 60.0,
        }
    }
}

fn contains_any(model: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| model.contains(&k.to_lowercase()))
}

impl SystemRules {
    /// Case-insensitive keyword match; either component can lift the tier
    pub fn classify(&self, cpu_model: &str, gpu_model: &str) -> HardwareTier {
        let cpu = cpu_model.to_lowercase();
        let gpu = gpu_model.to_lowercase();

        if contains_any(&cpu, &self.high_end_cpu) || contains_any(&gpu, &self.high_end_gpu) {
            HardwareTier::HighEnd
        } else if contains_any(&cpu, &self.mid_range_cpu) || contains_any(&gpu, &self.mid_range_gpu) {
            HardwareTier::MidRange
        } else {
            HardwareTier::LowEnd
        }
    }

    pub fn recommend(&self, data: &SystemData, provenance: Provenance) -> SystemRecommendation {
        let tier = self.classify(&data.cpu_model, &data.gpu_model);

        let (graphics, resolution, vsync, bottleneck) = match tier {
            HardwareTier::HighEnd => (
                "high",
                "1440p",
                "adaptive",
                if data.fps > self.high_end_fps_floor { "none" } else { "check cooling" },
            ),
            HardwareTier::MidRange => (
                "medium",
                "1080p",
                if data.fps < self.mid_range_vsync_fps { "on" } else { "adaptive" },
                if data.gpu_usage > self.bottleneck_usage {
                    "GPU"
                } else if data.cpu_usage > self.bottleneck_usage {
                    "CPU"
                } else {
                    "none"
                },
            ),
            HardwareTier::LowEnd => (
                "low",
                if data.fps > self.low_end_fps_floor { "1080p" } else { "720p" },
                "off",
                "hardware limitations",
            ),
        };

        SystemRecommendation {
            graphics_settings: graphics.to_string(),
            resolution: resolution.to_string(),
            vsync: vsync.to_string(),
            process_priority: "high".to_string(),
            bottleneck_diagnosis: bottleneck.to_string(),
            hardware_tier: tier,
            provenance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerRules {
    pub base_quality: f64,
    pub ping_weight: f64,
    pub jitter_weight: f64,
    pub packet_loss_weight: f64,
}

impl Default for ServerRules {
    fn default() -> Self {
        Self {
            base_quality: 100.0,
            ping_weight: 0.5,
            jitter_weight: 2.0,
            packet_loss_weight: 10.0,
        }
    }
}

impl ServerRules {
    pub fn quality(&self, server: &ServerData) -> f64 {
        let score = self.base_quality
            - server.ping * self.ping_weight
            - server.jitter * self.jitter_weight
            - server.packet_loss * self.packet_loss_weight;
        score.max(0.0)
    }

    /// Stable sort by (ping, jitter, packet_loss) ascending, ranks from 1
    pub fn rank(&self, servers: &[ServerData], is_fallback: bool) -> Result<Vec<ServerRecommendation>, EngineError> {
        if let Some(bad) = servers
            .iter()
            .find(|s| !(s.ping.is_finite() && s.jitter.is_finite() && s.packet_loss.is_finite()))
        {
            return Err(EngineError::NonFiniteInput(format!("server {} has non-finite metrics", bad.server_id)));
        }

        let mut sorted: Vec<&ServerData> = servers.iter().collect();
        sorted.sort_by(|a, b| {
            a.ping
                .total_cmp(&b.ping)
                .then(a.jitter.total_cmp(&b.jitter))
                .then(a.packet_loss.total_cmp(&b.packet_loss))
        });

        Ok(sorted
            .into_iter()
            .enumerate()
            .map(|(i, server)| ServerRecommendation {
                server_id: server.server_id,
                name: server.name.clone(),
                predicted_quality: self.quality(server),
                rank: i + 1,
                is_fallback,
            })
            .collect())
    }
}
