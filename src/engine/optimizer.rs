//! Rule engine over stored telemetry: bottleneck analysis and optimization steps.

use serde::{Deserialize, Serialize};

use crate::common::constants::DEFAULT_ANALYSIS_NOTE;
use crate::store::records::{NetworkReading, SystemReading};

const CPU_BOTTLENECK_PERCENT: f64 = 90.0;
const GPU_BOTTLENECK_PERCENT: f64 = 95.0;
const MEMORY_BOTTLENECK_PERCENT: f64 = 90.0;
const THERMAL_LIMIT_CELSIUS: f64 = 85.0;

const HIGH_LATENCY_MS: f64 = 100.0;
const HIGH_JITTER_MS: f64 = 20.0;
const HIGH_PACKET_LOSS_PERCENT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Recommendation {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub automated: bool,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemAnalysis {
    pub cpu_bottleneck: bool,
    pub gpu_bottleneck: bool,
    pub memory_bottleneck: bool,
    pub thermal_issues: bool,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkAnalysis {
    pub high_latency: bool,
    pub high_jitter: bool,
    pub high_packet_loss: bool,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn average<'a>(values: impl Iterator<Item = &'a f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Map recommendations 1:1 to automated high-priority steps
pub fn generate_steps(recommendations: &[Recommendation]) -> Vec<OptimizationStep> {
    recommendations
        .iter()
        .map(|rec| OptimizationStep {
            kind: rec.kind.clone(),
            description: rec.description.clone(),
            automated: true,
            priority: "high".to_string(),
        })
        .collect()
}

pub struct SystemOptimizer;

impl SystemOptimizer {
    /// Analyze system samples already filtered to one game
    pub fn analyze(samples: &[SystemReading], game_id: &str) -> SystemAnalysis {
        let avg_cpu = average(samples.iter().map(|s| &s.cpu_usage));
        let avg_gpu = average(samples.iter().map(|s| &s.gpu_usage));
        let avg_ram = average(samples.iter().map(|s| &s.ram_usage));
        let max_temp = samples.iter().map(|s| s.temperature).fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |m| m.max(t)))
        });

        let cpu_bottleneck = avg_cpu.is_some_and(|v| v > CPU_BOTTLENECK_PERCENT);
        let gpu_bottleneck = avg_gpu.is_some_and(|v| v > GPU_BOTTLENECK_PERCENT);
        let memory_bottleneck = avg_ram.is_some_and(|v| v > MEMORY_BOTTLENECK_PERCENT);
        let thermal_issues = max_temp.is_some_and(|v| v > THERMAL_LIMIT_CELSIUS);

        let mut recommendations = vec![
            Recommendation::new("game_mode", "Enable Game Mode"),
            Recommendation::new("power_plan", "High Performance"),
        ];
        if cpu_bottleneck {
            recommendations.push(Recommendation::new("background_apps", "Close background applications to free CPU time"));
        }
        if gpu_bottleneck {
            recommendations.push(Recommendation::new("graphics_preset", "Lower the in-game graphics preset"));
        }
        if memory_bottleneck {
            recommendations.push(Recommendation::new("memory_cleanup", "Free standby memory before launching the game"));
        }
        if thermal_issues {
            recommendations.push(Recommendation::new("cooling", "Improve cooling or raise fan curves"));
        }

        tracing::debug!(
            "🔍 System analysis for {}: {} samples, cpu={} gpu={} mem={} thermal={}",
            game_id, samples.len(), cpu_bottleneck, gpu_bottleneck, memory_bottleneck, thermal_issues
        );

        SystemAnalysis {
            cpu_bottleneck,
            gpu_bottleneck,
            memory_bottleneck,
            thermal_issues,
            recommendations,
            note: None,
        }
    }

    /// Recommendations used when no system samples exist
    pub fn default_analysis() -> SystemAnalysis {
        SystemAnalysis {
            recommendations: vec![
                Recommendation::new("game_mode", "Enable Windows Game Mode"),
                Recommendation::new("power_plan", "Set power plan to High Performance"),
            ],
            note: Some(DEFAULT_ANALYSIS_NOTE.to_string()),
            ..SystemAnalysis::default()
        }
    }
}

pub struct NetworkOptimizer;

impl NetworkOptimizer {
    /// Analyze network samples already filtered to one game
    pub fn analyze(samples: &[NetworkReading], game_id: &str) -> NetworkAnalysis {
        let high_latency = average(samples.iter().map(|s| &s.ping)).is_some_and(|v| v > HIGH_LATENCY_MS);
        let high_jitter = average(samples.iter().map(|s| &s.jitter)).is_some_and(|v| v > HIGH_JITTER_MS);
        let high_packet_loss =
            average(samples.iter().map(|s| &s.packet_loss)).is_some_and(|v| v > HIGH_PACKET_LOSS_PERCENT);

        let mut recommendations = vec![
            Recommendation::new("dns_optimization", "Use gaming DNS"),
            Recommendation::new("tcp_optimization", "Optimize TCP settings"),
        ];
        if high_latency {
            recommendations.push(Recommendation::new("server_selection", "Connect to a closer game server region"));
        }
        if high_jitter {
            recommendations.push(Recommendation::new("connection_type", "Switch to a wired connection"));
        }
        if high_packet_loss {
            recommendations.push(Recommendation::new("qos", "Enable QoS prioritization for game traffic"));
        }

        tracing::debug!(
            "🔍 Network analysis for {}: {} samples, latency={} jitter={} loss={}",
            game_id, samples.len(), high_latency, high_jitter, high_packet_loss
        );

        NetworkAnalysis {
            high_latency,
            high_jitter,
            high_packet_loss,
            recommendations,
            note: None,
        }
    }

    /// Recommendations used when no network samples exist
    pub fn default_analysis() -> NetworkAnalysis {
        NetworkAnalysis {
            recommendations: vec![
                Recommendation::new("dns_optimization", "Use gaming-optimized DNS servers"),
                Recommendation::new("network_priority", "Set network adapter to prioritize gaming traffic"),
            ],
            note: Some(DEFAULT_ANALYSIS_NOTE.to_string()),
            ..NetworkAnalysis::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(cpu: f64, gpu: f64, ram: f64, temp: f64) -> SystemReading {
        SystemReading {
            cpu_usage: cpu,
            gpu_usage: gpu,
            ram_usage: ram,
            fps: 120.0,
            temperature: temp,
        }
    }

    fn network(ping: f64, jitter: f64, loss: f64) -> NetworkReading {
        NetworkReading {
            ping,
            jitter,
            packet_loss: loss,
            download_speed: 0.0,
            upload_speed: 0.0,
        }
    }

    fn kinds(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.kind.as_str()).collect()
    }

    #[test]
    fn test_empty_samples_yield_fixed_pair_only() {
        let analysis = SystemOptimizer::analyze(&[], "valorant");
        assert!(!analysis.cpu_bottleneck && !analysis.gpu_bottleneck);
        assert!(!analysis.memory_bottleneck && !analysis.thermal_issues);
        assert_eq!(kinds(&analysis.recommendations), vec!["game_mode", "power_plan"]);

        let analysis = NetworkOptimizer::analyze(&[], "valorant");
        assert_eq!(kinds(&analysis.recommendations), vec!["dns_optimization", "tcp_optimization"]);
    }

    #[test]
    fn test_system_flags_follow_thresholds() {
        let samples = vec![system(95.0, 99.0, 50.0, 70.0), system(92.0, 97.0, 60.0, 88.0)];
        let analysis = SystemOptimizer::analyze(&samples, "cs2");

        assert!(analysis.cpu_bottleneck);
        assert!(analysis.gpu_bottleneck);
        assert!(!analysis.memory_bottleneck);
        assert!(analysis.thermal_issues);
        assert_eq!(
            kinds(&analysis.recommendations),
            vec!["game_mode", "power_plan", "background_apps", "graphics_preset", "cooling"]
        );
    }

    #[test]
    fn test_network_flags_use_averages() {
        let samples = vec![network(150.0, 10.0, 0.0), network(90.0, 10.0, 5.0)];
        let analysis = NetworkOptimizer::analyze(&samples, "cs2");

        assert!(analysis.high_latency);
        assert!(!analysis.high_jitter);
        assert!(analysis.high_packet_loss);
        assert_eq!(
            kinds(&analysis.recommendations),
            vec!["dns_optimization", "tcp_optimization", "server_selection", "qos"]
        );
    }

    #[test]
    fn test_generate_steps_is_one_to_one_and_idempotent() {
        let analysis = SystemOptimizer::default_analysis();
        let first = generate_steps(&analysis.recommendations);
        let second = generate_steps(&analysis.recommendations);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|s| s.automated && s.priority == "high"));
        assert_eq!(first[0].description, "Enable Windows Game Mode");

        let json = serde_json::to_value(&first[1]).unwrap();
        assert_eq!(json["type"], "power_plan");
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let readings = vec![system(95.0, 99.0, 91.0, 88.0), system(40.0, 50.0, 60.0, 65.0)];
        let first = serde_json::to_vec(&SystemOptimizer::analyze(&readings, "cs2")).unwrap();
        let second = serde_json::to_vec(&SystemOptimizer::analyze(&readings, "cs2")).unwrap();
        assert_eq!(first, second);

        let readings = vec![network(120.0, 25.0, 3.0), network(30.0, 2.0, 0.0)];
        let first = serde_json::to_vec(&NetworkOptimizer::analyze(&readings, "cs2")).unwrap();
        let second = serde_json::to_vec(&NetworkOptimizer::analyze(&readings, "cs2")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_analysis_carries_note() {
        let analysis = NetworkOptimizer::default_analysis();
        assert_eq!(analysis.note.as_deref(), Some(DEFAULT_ANALYSIS_NOTE));
        assert_eq!(kinds(&analysis.recommendations), vec!["dns_optimization", "network_priority"]);
    }
}
