use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::core::Result;
use crate::models::implementations::finbert::FinBertModel;
use crate::pipelines::utils::{device_name, DeviceRequest};

pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device_request = DeviceRequest::Explicit(device);
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    /// Load tokenizer and weights. Any failure is returned as is; callers
    /// must not serve traffic without a built pipeline.
    pub async fn build(self) -> Result<SentimentAnalysisPipeline<M>> {
        let device = self.device_request.resolve()?;
        let model_id = self.options.to_string();
        tracing::info!(model = %model_id, device = device_name(&device), "loading sentiment model");

        let model = M::new(self.options.clone(), device).await?;
        let tokenizer = M::get_tokenizer(self.options).await?;

        tracing::info!(model = %model_id, "sentiment model ready");
        Ok(SentimentAnalysisPipeline {
            model,
            tokenizer,
            model_id,
        })
    }
}

impl SentimentAnalysisPipelineBuilder<FinBertModel> {
    /// FinBERT from a Hub repository id or a local checkpoint directory.
    pub fn finbert(model_id: impl Into<String>) -> Self {
        Self::new(model_id.into().into())
    }
}
