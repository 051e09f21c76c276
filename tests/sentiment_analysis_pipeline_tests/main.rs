// Integration tests for the FinBERT pipeline against a real checkpoint
// Downloads ProsusAI/finbert (or reads FINBERT_MODEL_PATH); run with --ignored

use finbert_sentiment::pipelines::sentiment_analysis_pipeline::*;

async fn pipeline() -> anyhow::Result<SentimentAnalysisPipeline<FinBertModel>> {
    let model_id = std::env::var("FINBERT_MODEL_PATH")
        .unwrap_or_else(|_| FinBertOptions::default().model_id);
    Ok(SentimentAnalysisPipelineBuilder::finbert(model_id)
        .cpu()
        .build()
        .await?)
}

#[tokio::test]
#[ignore = "needs the FinBERT checkpoint"]
async fn basic_sentiment() -> anyhow::Result<()> {
    let pipeline = pipeline().await?;

    for text in [
        "Company XYZ reports record profits in Q3",
        "Company ABC faces lawsuits over data breach",
        "The board meets on Tuesday",
    ] {
        let prediction = pipeline.predict(text)?;
        assert!(SentimentLabel::ALL.contains(&prediction.label));
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }
    Ok(())
}

#[tokio::test]
#[ignore = "needs the FinBERT checkpoint"]
async fn predictions_are_deterministic() -> anyhow::Result<()> {
    let pipeline = pipeline().await?;
    let text = "Company XYZ reports record profits in Q3";

    let first = pipeline.predict(text)?;
    let second = pipeline.predict(text)?;
    assert_eq!(first.label, second.label);
    assert!((first.confidence - second.confidence).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
#[ignore = "needs the FinBERT checkpoint"]
async fn long_text_is_truncated() -> anyhow::Result<()> {
    let pipeline = pipeline().await?;
    let text = "Shares fell sharply after the profit warning. ".repeat(400);

    let prediction = pipeline.predict(&text)?;
    assert!((0.0..=1.0).contains(&prediction.confidence));
    Ok(())
}

#[tokio::test]
#[ignore = "needs the FinBERT checkpoint"]
async fn empty_text_is_neutral() -> anyhow::Result<()> {
    let pipeline = pipeline().await?;
    assert_eq!(analyze("", &pipeline), (SentimentLabel::Neutral, 0.0));
    assert_eq!(analyze("   ", &pipeline), (SentimentLabel::Neutral, 0.0));
    Ok(())
}
